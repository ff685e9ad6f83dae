use std::path::Path;

use anyhow::{anyhow, Context, Result};
use dataming::{CsvOptions, JsonOptions, OutputShape, SimulatorConfig, StreamingSimulator};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// One synthetic sensor reading.
#[derive(Debug, Serialize)]
struct Reading {
    id: i64,
    sensor: &'static str,
    temperature: f64,
    humidity: f64,
    ok: bool,
}

fn generate_readings(n: i64, rng: &mut StdRng) -> Result<Vec<Reading>> {
    // (name, mean temperature, mean humidity)
    let sensors: [(&str, f64, f64); 3] = [("north", 18.0, 55.0), ("south", 24.0, 40.0), ("roof", 12.0, 70.0)];
    let temp_noise = Normal::new(0.0, 1.5).map_err(|e| anyhow!("temperature noise: {e}"))?;
    let hum_noise = Normal::new(0.0, 4.0).map_err(|e| anyhow!("humidity noise: {e}"))?;

    Ok((0..n)
        .map(|id| {
            let (sensor, temp, hum) = sensors[id as usize % sensors.len()];
            let temperature = ((temp + temp_noise.sample(&mut *rng)) * 100.0).round() / 100.0;
            let humidity = ((hum + hum_noise.sample(&mut *rng)) * 10.0).round() / 10.0;
            Reading {
                id,
                sensor,
                temperature,
                humidity,
                ok: humidity < 80.0,
            }
        })
        .collect())
}

fn write_csv(path: &Path, readings: &[Reading]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for r in readings {
        writer.serialize(r).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_json_array(path: &Path, readings: &[Reading]) -> Result<()> {
    let text = serde_json::to_string_pretty(readings).context("encoding JSON")?;
    std::fs::write(path, text).context("writing JSON file")
}

fn write_json_lines(path: &Path, readings: &[Reading]) -> Result<()> {
    let mut text = String::new();
    for r in readings {
        text.push_str(&serde_json::to_string(r).context("encoding JSON line")?);
        text.push('\n');
    }
    std::fs::write(path, text).context("writing JSON lines file")
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(42);
    let readings = generate_readings(30, &mut rng)?;

    let csv_path = Path::new("sample_readings.csv");
    let json_path = Path::new("sample_readings.json");
    let lines_path = Path::new("sample_readings_lines.json");

    write_csv(csv_path, &readings)?;
    write_json_array(json_path, &readings)?;
    write_json_lines(lines_path, &readings)?;

    println!(
        "Wrote {} readings to {}, {} and {}",
        readings.len(),
        csv_path.display(),
        json_path.display(),
        lines_path.display()
    );

    // Load each file back so a broken writer shows up here, then replay one.
    let fast = SimulatorConfig::new().with_lapse(0.0);
    StreamingSimulator::json(json_path, &fast, &JsonOptions::default())
        .context("re-reading JSON array sample")?;
    StreamingSimulator::json(lines_path, &fast, &JsonOptions::lines())
        .context("re-reading JSON lines sample")?;

    let config = SimulatorConfig::new()
        .with_lapse(0.2)
        .with_data_window(5)
        .with_response_type(OutputShape::ArrayDict);
    let sim = StreamingSimulator::csv(csv_path, &config, &CsvOptions::default())
        .context("loading CSV sample")?;
    sim.simulate_print();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_are_reproducible_for_a_seed() {
        let a = generate_readings(9, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate_readings(9, &mut StdRng::seed_from_u64(7)).unwrap();

        assert_eq!(a.len(), 9);
        let key = |r: &Reading| (r.id, r.sensor, r.temperature.to_bits(), r.humidity.to_bits());
        assert_eq!(a.iter().map(key).collect::<Vec<_>>(), b.iter().map(key).collect::<Vec<_>>());
        assert_eq!(a[0].sensor, "north");
        assert_eq!(a[4].sensor, "south");
        assert!(a.iter().all(|r| r.temperature.is_finite()));
    }
}
