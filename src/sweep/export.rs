/// Export sweep results: the wide-format dataset CSV and the run summary
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::{write::GzEncoder, Compression};
use serde::Serialize;

use super::config::SweepCase;
use crate::error::SweepResult;
use crate::javafoil::PolarPoint;
use crate::naca::SurfaceCoordinates;

pub const BASE_COLUMNS: [&str; 10] = ["FoilID", "m", "p", "t", "Alpha", "M", "Re", "CL", "CD", "Cm"];

/// Dataset header for `num_points` geometry stations (edges excluded).
pub fn dataset_header(num_points: usize) -> Vec<String> {
    let interior = num_points.saturating_sub(2);
    BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain((1..=interior).map(|k| format!("yU{}", k)))
        .chain((1..=interior).map(|k| format!("yL{}", k)))
        .collect()
}

/// One angle of attack of one case, with the section's surface ordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetRow {
    pub foil_id: String,
    pub max_camber: u8,
    pub camber_location: u8,
    pub thickness: u8,
    pub alpha: f64,
    pub mach: f64,
    pub reynolds: u64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
    pub y_upper: Vec<f64>,
    pub y_lower: Vec<f64>,
}

impl DatasetRow {
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(BASE_COLUMNS.len() + 2 * self.y_upper.len());
        record.push(self.foil_id.clone());
        record.push(self.max_camber.to_string());
        record.push(self.camber_location.to_string());
        record.push(self.thickness.to_string());
        record.push(float(self.alpha));
        record.push(float(self.mach));
        record.push(self.reynolds.to_string());
        record.push(float(self.cl));
        record.push(float(self.cd));
        record.push(float(self.cm));
        record.extend(self.y_upper.iter().map(|&y| float(y)));
        record.extend(self.y_lower.iter().map(|&y| float(y)));
        record
    }
}

/// Floats always keep a decimal point: `-10.0`, not `-10`.
fn float(v: f64) -> String {
    format!("{:?}", v)
}

/// Combine a case's polar with its geometry, one row per angle of attack.
pub fn build_rows(
    case: &SweepCase,
    polar: &[PolarPoint],
    coords: &SurfaceCoordinates,
) -> Vec<DatasetRow> {
    let y_upper: Vec<f64> = coords.upper_y().collect();
    let y_lower: Vec<f64> = coords.lower_y().collect();
    let foil_id = case.airfoil.name();

    polar
        .iter()
        .map(|point| DatasetRow {
            foil_id: foil_id.clone(),
            max_camber: case.airfoil.max_camber(),
            camber_location: case.airfoil.camber_location(),
            thickness: case.airfoil.thickness(),
            alpha: point.alpha,
            mach: case.mach,
            reynolds: case.reynolds,
            cl: point.cl,
            cd: point.cd,
            cm: point.cm,
            y_upper: y_upper.clone(),
            y_lower: y_lower.clone(),
        })
        .collect()
}

/// Byte sink below the CSV writer.
enum Sink<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Sink<W> {
    /// Write the gzip trailer when compressed, then flush the inner writer.
    fn finish(self) -> std::io::Result<W> {
        let mut inner = match self {
            Sink::Plain(inner) => inner,
            Sink::Gzip(encoder) => encoder.finish()?,
        };
        inner.flush()?;
        Ok(inner)
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// CSV writer for the dataset, plain or gzip-compressed.
pub struct DatasetWriter<W: Write = BufWriter<File>> {
    path: PathBuf,
    writer: csv::Writer<Sink<W>>,
    rows_written: usize,
}

impl DatasetWriter {
    /// Create (truncate) the dataset file. A `.gz` extension selects gzip.
    pub fn create<P: AsRef<Path>>(path: P) -> SweepResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = BufWriter::new(File::create(&path)?);
        let compress = path.extension().map_or(false, |e| e == "gz");
        Ok(Self::from_writer(path, file, compress))
    }
}

impl<W: Write> DatasetWriter<W> {
    /// Wrap an open writer; `path` is only reported back to callers.
    pub fn from_writer(path: PathBuf, inner: W, compress: bool) -> Self {
        let sink = if compress {
            Sink::Gzip(GzEncoder::new(inner, Compression::default()))
        } else {
            Sink::Plain(inner)
        };

        Self {
            path,
            writer: csv::Writer::from_writer(sink),
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn write_header(&mut self, num_points: usize) -> SweepResult<()> {
        self.writer.write_record(dataset_header(num_points))?;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[DatasetRow]) -> SweepResult<()> {
        for row in rows {
            self.writer.write_record(row.to_record())?;
        }
        self.rows_written += rows.len();
        Ok(())
    }

    /// Flush buffered rows through to disk.
    pub fn flush(&mut self) -> SweepResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and close, finishing the gzip stream when compressed.
    pub fn finish(self) -> SweepResult<usize> {
        let rows = self.rows_written;
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))?;
        sink.finish()?;
        Ok(rows)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FailedCase {
    pub case_id: String,
    pub reason: String,
}

/// Summary written next to the dataset after a full sweep.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub study_name: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_s: f64,
    pub total_cases: usize,
    pub completed_cases: usize,
    pub rows_written: usize,
    pub dataset_path: PathBuf,
    pub failed_cases: Vec<FailedCase>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failed_cases.len()
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> SweepResult<()> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naca::NacaFourDigit;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn sample_rows() -> Vec<DatasetRow> {
        let case = SweepCase::new(NacaFourDigit::new(0, 40, 12).unwrap(), 200_000, 0.2);
        let coords = case.airfoil.surface_coordinates(5);
        let polar = [
            PolarPoint {
                alpha: -1.0,
                cl: -0.11,
                cd: 0.007,
                cm: 0.0,
            },
            PolarPoint {
                alpha: 1.0,
                cl: 0.11,
                cd: 0.007,
                cm: 0.0,
            },
        ];
        build_rows(&case, &polar, &coords)
    }

    #[test]
    fn header_lists_interior_stations() {
        let header = dataset_header(5);
        assert_eq!(header.len(), 10 + 3 + 3);
        assert_eq!(header[0], "FoilID");
        assert_eq!(header[9], "Cm");
        assert_eq!(header[10], "yU1");
        assert_eq!(header[12], "yU3");
        assert_eq!(header[13], "yL1");
        assert_eq!(header[15], "yL3");
    }

    #[test]
    fn rows_carry_case_and_geometry() {
        let rows = sample_rows();
        assert_eq!(rows.len(), 2);
        let record = rows[1].to_record();
        assert_eq!(record.len(), dataset_header(5).len());
        assert_eq!(&record[..8], &["NACA0412", "0", "40", "12", "1.0", "0.2", "200000", "0.11"]);
        assert_eq!(rows[0].y_upper, rows[1].y_upper);
    }

    #[test]
    fn writes_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut writer = DatasetWriter::create(&path).unwrap();
        writer.write_header(5).unwrap();
        writer.write_rows(&sample_rows()).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("FoilID,m,p,t,Alpha,M,Re,CL,CD,Cm,yU1"));
        assert!(lines[1].starts_with("NACA0412,0,40,12,-1.0,0.2,200000,-0.11,"));
    }

    #[test]
    fn writes_gzip_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv.gz");
        let mut writer = DatasetWriter::create(&path).unwrap();
        writer.write_header(5).unwrap();
        writer.write_rows(&sample_rows()).unwrap();
        writer.finish().unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("FoilID,"));
    }

    /// Stands in for a disk that fills up once `full` is set.
    struct Disk {
        full: Arc<AtomicBool>,
        bytes: Vec<u8>,
    }

    impl Write for Disk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.full.load(Ordering::Relaxed) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"));
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn gzip_trailer_failure_is_reported() {
        let full = Arc::new(AtomicBool::new(false));
        let disk = Disk {
            full: Arc::clone(&full),
            bytes: Vec::new(),
        };
        let mut writer = DatasetWriter::from_writer(PathBuf::from("data.csv.gz"), disk, true);
        writer.write_header(5).unwrap();
        writer.write_rows(&sample_rows()).unwrap();
        writer.flush().unwrap();

        // Only the end of the gzip stream is left to write
        full.store(true, Ordering::Relaxed);
        assert!(writer.finish().is_err());
    }

    #[test]
    fn finish_returns_complete_gzip_stream() {
        let disk = Disk {
            full: Arc::new(AtomicBool::new(false)),
            bytes: Vec::new(),
        };
        let mut writer = DatasetWriter::from_writer(PathBuf::from("data.csv.gz"), disk, true);
        writer.write_header(5).unwrap();
        writer.write_rows(&sample_rows()).unwrap();
        let sink = writer.writer.into_inner().ok().unwrap();
        let disk = sink.finish().unwrap();

        let mut text = String::new();
        GzDecoder::new(disk.bytes.as_slice())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn summary_serialises_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = RunSummary {
            study_name: "demo".to_string(),
            started_at: Utc::now(),
            elapsed_s: 1.5,
            total_cases: 2,
            completed_cases: 1,
            rows_written: 21,
            dataset_path: PathBuf::from("data.csv"),
            failed_cases: vec![FailedCase {
                case_id: "NACA0012_Re100000_M0p1".to_string(),
                reason: "Polar file not written".to_string(),
            }],
        };
        summary.write_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_cases"], 2);
        assert_eq!(value["failed_cases"][0]["case_id"], "NACA0012_Re100000_M0p1");
        assert_eq!(summary.failed(), 1);
    }
}
