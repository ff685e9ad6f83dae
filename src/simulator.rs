use std::convert::Infallible;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::config::{
    CsvOptions, JsonOptions, OutputShape, SimulatorConfig, SourceFormat, DEFAULT_HEAD_LINES,
};
use crate::data::loader::{load_csv, load_json};
use crate::data::model::{format_window, Dataset, Record};
use crate::data::window::{window_count, Windows};
use crate::error::Result;

// ---------------------------------------------------------------------------
// StreamingSimulator
// ---------------------------------------------------------------------------

/// Replays a file as a paced stream of record windows.
///
/// The file is read in full when the simulator is built; a simulator that
/// exists always holds its complete dataset. Every call to
/// [`simulate`](Self::simulate) replays the whole file from the first window.
#[derive(Debug, Clone)]
pub struct StreamingSimulator {
    path: PathBuf,
    format: SourceFormat,
    lapse: Duration,
    window: NonZeroUsize,
    shape: OutputShape,
    dataset: Dataset,
}

impl StreamingSimulator {
    /// Build a simulator over a delimited text file (`.csv`).
    pub fn csv(
        path: impl AsRef<Path>,
        config: &SimulatorConfig,
        options: &CsvOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        SourceFormat::Csv.check_path(path)?;
        let (lapse, window) = validate(config)?;
        let dataset = load_csv(path, options)?;
        Ok(Self::from_parts(path, SourceFormat::Csv, lapse, window, config, dataset))
    }

    /// Build a simulator over a JSON file (`.json`), either one value per line
    /// or a top-level array of values.
    pub fn json(
        path: impl AsRef<Path>,
        config: &SimulatorConfig,
        options: &JsonOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        SourceFormat::Json.check_path(path)?;
        let (lapse, window) = validate(config)?;
        let dataset = load_json(path, options)?;
        Ok(Self::from_parts(path, SourceFormat::Json, lapse, window, config, dataset))
    }

    /// Build a simulator, picking the loader from the file extension.
    /// Format options are the defaults (comma-separated CSV, JSON array).
    pub fn open(path: impl AsRef<Path>, config: &SimulatorConfig) -> Result<Self> {
        let path = path.as_ref();
        match SourceFormat::from_path(path)? {
            SourceFormat::Csv => Self::csv(path, config, &CsvOptions::default()),
            SourceFormat::Json => Self::json(path, config, &JsonOptions::default()),
        }
    }

    fn from_parts(
        path: &Path,
        format: SourceFormat,
        lapse: Duration,
        window: NonZeroUsize,
        config: &SimulatorConfig,
        dataset: Dataset,
    ) -> Self {
        StreamingSimulator {
            path: path.to_path_buf(),
            format,
            lapse,
            window,
            shape: config.response_type,
            dataset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn lapse(&self) -> Duration {
        self.lapse
    }

    pub fn data_window(&self) -> usize {
        self.window.get()
    }

    pub fn response_type(&self) -> OutputShape {
        self.shape
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Number of loaded records.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Number of windows a full run emits.
    pub fn window_count(&self) -> usize {
        window_count(self.dataset.len(), self.window)
    }

    /// The first `lines` records, shaped like the emitted ones.
    pub fn data_head(&self, lines: usize) -> Vec<Record> {
        self.dataset
            .rows()
            .iter()
            .take(lines)
            .map(|row| self.dataset.shape(row, self.shape))
            .collect()
    }

    /// [`data_head`](Self::data_head) with the default of five lines.
    pub fn head(&self) -> Vec<Record> {
        self.data_head(DEFAULT_HEAD_LINES)
    }

    /// The windows a run would emit, without any pacing.
    pub fn windows(&self) -> Windows<'_> {
        Windows::new(&self.dataset, self.window, self.shape)
    }

    /// Replay the dataset, sleeping `lapse` before each window and handing the
    /// window to `on_simulate`.
    pub fn simulate<F>(&self, mut on_simulate: F)
    where
        F: FnMut(&[Record]),
    {
        let result: std::result::Result<(), Infallible> = self.try_simulate(|window| {
            on_simulate(window);
            Ok(())
        });
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Like [`simulate`](Self::simulate), but the callback may fail. The first
    /// error stops the run and is returned as is; no further windows are
    /// emitted.
    pub fn try_simulate<F, E>(&self, mut on_simulate: F) -> std::result::Result<(), E>
    where
        F: FnMut(&[Record]) -> std::result::Result<(), E>,
    {
        log::info!(
            "Simulating {} rows from {} ({} windows of {}, lapse {:?})",
            self.dataset.len(),
            self.path.display(),
            self.window_count(),
            self.window,
            self.lapse
        );

        for (index, window) in self.windows().enumerate() {
            thread::sleep(self.lapse);
            log::debug!("Emitting window {index} ({} records)", window.len());
            if let Err(e) = on_simulate(&window) {
                log::warn!("Simulation of {} stopped at window {index}", self.path.display());
                return Err(e);
            }
        }

        log::info!("Simulation of {} finished", self.path.display());
        Ok(())
    }

    /// Replay the dataset, printing each window to stdout.
    pub fn simulate_print(&self) {
        self.simulate(|window| println!("{}", format_window(window)));
    }
}

fn validate(config: &SimulatorConfig) -> Result<(Duration, NonZeroUsize)> {
    Ok((config.lapse_duration()?, config.window_size()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::error::SimulatorError;
    use std::io::Write;
    use std::time::Instant;

    fn fixture(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn fast(window: usize, shape: OutputShape) -> SimulatorConfig {
        SimulatorConfig::new()
            .with_lapse(0.0)
            .with_data_window(window)
            .with_response_type(shape)
    }

    fn ints(values: &[i64]) -> Record {
        Record::Positional(values.iter().map(|&i| Value::Integer(i)).collect())
    }

    fn named(pairs: &[(&str, i64)]) -> Record {
        Record::Named(pairs.iter().map(|&(k, v)| (k, Value::Integer(v))).collect())
    }

    fn collect(sim: &StreamingSimulator) -> Vec<Vec<Record>> {
        let mut seen = Vec::new();
        sim.simulate(|w| seen.push(w.to_vec()));
        seen
    }

    const THREE_ROWS: &str = "a,b\n1,2\n3,4\n5,6\n";

    #[test]
    fn csv_positional_windows() {
        let file = fixture(".csv", THREE_ROWS);
        let sim = StreamingSimulator::csv(
            file.path(),
            &fast(2, OutputShape::Array),
            &CsvOptions::default(),
        )
        .unwrap();

        assert_eq!(sim.window_count(), 2);
        assert_eq!(
            collect(&sim),
            vec![vec![ints(&[1, 2]), ints(&[3, 4])], vec![ints(&[5, 6])]]
        );
    }

    #[test]
    fn csv_mapping_windows() {
        let file = fixture(".csv", THREE_ROWS);
        let sim = StreamingSimulator::csv(
            file.path(),
            &fast(2, OutputShape::ArrayDict),
            &CsvOptions::default(),
        )
        .unwrap();

        assert_eq!(
            collect(&sim),
            vec![
                vec![named(&[("a", 1), ("b", 2)]), named(&[("a", 3), ("b", 4)])],
                vec![named(&[("a", 5), ("b", 6)])],
            ]
        );
    }

    #[test]
    fn json_lines_one_record_per_window() {
        let file = fixture(".json", "{\"id\": 1}\n{\"id\": 2}\n");
        let sim = StreamingSimulator::json(
            file.path(),
            &fast(1, OutputShape::ArrayDict),
            &JsonOptions::lines(),
        )
        .unwrap();

        assert_eq!(
            collect(&sim),
            vec![vec![named(&[("id", 1)])], vec![named(&[("id", 2)])]]
        );
    }

    #[test]
    fn json_array_positional() {
        let file = fixture(".json", r#"[{"x": 1, "y": 2}, {"x": 3, "y": 4}, {"x": 5, "y": 6}]"#);
        let sim = StreamingSimulator::json(
            file.path(),
            &fast(2, OutputShape::Array),
            &JsonOptions::default(),
        )
        .unwrap();

        assert_eq!(
            collect(&sim),
            vec![vec![ints(&[1, 2]), ints(&[3, 4])], vec![ints(&[5, 6])]]
        );
    }

    #[test]
    fn json_positional_rows_line_up_with_columns() {
        let file = fixture(".json", r#"[{"a": 1, "b": 2}, {"b": 3, "a": 4}, {"b": 5}]"#);
        let sim = StreamingSimulator::json(
            file.path(),
            &fast(3, OutputShape::Array),
            &JsonOptions::default(),
        )
        .unwrap();

        assert_eq!(sim.dataset().columns(), ["a", "b"]);
        assert_eq!(
            collect(&sim),
            vec![vec![
                ints(&[1, 2]),
                ints(&[4, 3]),
                Record::Positional(vec![Value::Null, Value::Integer(5)]),
            ]]
        );
        assert_eq!(sim.data_head(3), collect(&sim).concat());
    }

    #[test]
    fn head_does_not_disturb_simulation() {
        let file = fixture(".csv", "n\n1\n2\n3\n4\n5\n6\n7\n");
        let sim = StreamingSimulator::csv(
            file.path(),
            &fast(3, OutputShape::Array),
            &CsvOptions::default(),
        )
        .unwrap();

        assert_eq!(sim.head().len(), 5);
        assert_eq!(sim.data_head(2), vec![ints(&[1]), ints(&[2])]);
        assert_eq!(sim.data_head(100).len(), 7);
        assert!(sim.data_head(0).is_empty());

        let flat: Vec<Record> = collect(&sim).into_iter().flatten().collect();
        assert_eq!(flat, sim.data_head(7));
    }

    #[test]
    fn running_twice_replays_from_the_start() {
        let file = fixture(".csv", THREE_ROWS);
        let sim = StreamingSimulator::csv(
            file.path(),
            &fast(2, OutputShape::Array),
            &CsvOptions::default(),
        )
        .unwrap();
        assert_eq!(collect(&sim), collect(&sim));
    }

    #[test]
    fn wrong_extension_is_format_mismatch() {
        let csv = fixture(".txt", THREE_ROWS);
        let err =
            StreamingSimulator::csv(csv.path(), &SimulatorConfig::new(), &CsvOptions::default())
                .unwrap_err();
        assert!(matches!(err, SimulatorError::FormatMismatch { expected: "csv", .. }));

        let json = fixture(".csv", "[]");
        let err = StreamingSimulator::json(
            json.path(),
            &SimulatorConfig::new(),
            &JsonOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimulatorError::FormatMismatch { expected: "json", .. }));

        let err = StreamingSimulator::open("data.xlsx", &SimulatorConfig::new()).unwrap_err();
        assert!(matches!(err, SimulatorError::FormatMismatch { .. }));
    }

    #[test]
    fn bad_configuration_fails_construction() {
        let file = fixture(".csv", THREE_ROWS);
        for config in [
            SimulatorConfig::new().with_data_window(0),
            SimulatorConfig::new().with_lapse(-0.5),
        ] {
            let err = StreamingSimulator::csv(file.path(), &config, &CsvOptions::default())
                .unwrap_err();
            assert!(matches!(err, SimulatorError::InvalidConfiguration(_)));
        }

        let opts = CsvOptions::default()
            .with_delimiter(';')
            .with_delim_whitespace(true);
        let err = StreamingSimulator::csv(file.path(), &SimulatorConfig::new(), &opts).unwrap_err();
        assert!(matches!(err, SimulatorError::InvalidConfiguration(_)));

        assert!(matches!(
            "records".parse::<OutputShape>(),
            Err(SimulatorError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn malformed_file_fails_construction() {
        let file = fixture(".json", "not json at all");
        let err =
            StreamingSimulator::json(file.path(), &SimulatorConfig::new(), &JsonOptions::default())
                .unwrap_err();
        assert!(matches!(err, SimulatorError::MalformedInput { .. }));
    }

    #[test]
    fn open_dispatches_on_extension() {
        let csv = fixture(".csv", THREE_ROWS);
        let sim = StreamingSimulator::open(csv.path(), &fast(1, OutputShape::Array)).unwrap();
        assert_eq!(sim.format(), SourceFormat::Csv);
        assert_eq!(sim.len(), 3);

        let json = fixture(".json", r#"[{"a": 1}]"#);
        let sim = StreamingSimulator::open(json.path(), &fast(1, OutputShape::Array)).unwrap();
        assert_eq!(sim.format(), SourceFormat::Json);
        assert_eq!(sim.len(), 1);
    }

    #[test]
    fn callback_error_stops_the_run() {
        let file = fixture(".csv", THREE_ROWS);
        let sim = StreamingSimulator::csv(
            file.path(),
            &fast(1, OutputShape::Array),
            &CsvOptions::default(),
        )
        .unwrap();

        let mut calls = 0;
        let result = sim.try_simulate(|_| {
            calls += 1;
            if calls == 2 {
                Err("consumer gave up")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("consumer gave up"));
        assert_eq!(calls, 2);
    }

    #[test]
    fn empty_dataset_never_calls_back() {
        let file = fixture(".csv", "a,b\n");
        let sim = StreamingSimulator::csv(
            file.path(),
            &fast(2, OutputShape::Array),
            &CsvOptions::default(),
        )
        .unwrap();
        assert!(sim.is_empty());
        assert!(collect(&sim).is_empty());
    }

    #[test]
    fn windows_are_paced_by_lapse() {
        let lapse = Duration::from_millis(30);
        let file = fixture(".csv", THREE_ROWS);
        let config = SimulatorConfig::new()
            .with_lapse(lapse.as_secs_f64())
            .with_data_window(1);
        let sim = StreamingSimulator::csv(file.path(), &config, &CsvOptions::default()).unwrap();

        let start = Instant::now();
        let mut returned_at = start;
        let mut gaps = Vec::new();
        sim.simulate(|_| {
            gaps.push(returned_at.elapsed());
            returned_at = Instant::now();
        });

        assert_eq!(gaps.len(), 3);
        assert!(gaps.iter().all(|gap| *gap >= lapse), "gaps: {gaps:?}");
    }
}
