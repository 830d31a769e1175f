use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SimError};
use crate::sim::Trajectory;

pub const HEADER: &str = "u,v,w,phi,theta,psi,alpha,beta,gamma,time";
pub const COLUMNS: usize = 10;

/// One persisted trajectory row. Body rates are not part of the file format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryRecord {
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub phi: f64,
    pub theta: f64,
    pub psi: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub time: f64,
}

impl TrajectoryRecord {
    pub fn from_columns(c: [f64; COLUMNS]) -> Self {
        Self {
            u: c[0], v: c[1], w: c[2],
            phi: c[3], theta: c[4], psi: c[5],
            alpha: c[6], beta: c[7], gamma: c[8],
            time: c[9],
        }
    }

    pub fn columns(&self) -> [f64; COLUMNS] {
        [
            self.u, self.v, self.w,
            self.phi, self.theta, self.psi,
            self.alpha, self.beta, self.gamma,
            self.time,
        ]
    }
}

/// Write trajectory data to CSV format.
///
/// Columns: u, v, w, phi, theta, psi, alpha, beta, gamma, time.
/// The header line is prefixed with `# ` so it reads as a comment.
pub fn write_trajectory<W: Write>(writer: &mut W, trajectory: &Trajectory) -> io::Result<()> {
    writeln!(writer, "# {HEADER}")?;
    for snap in trajectory {
        let row: Vec<String> = snap.record().iter().map(|x| x.to_string()).collect();
        writeln!(writer, "{}", row.join(","))?;
    }
    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file(path: impl AsRef<Path>, trajectory: &Trajectory) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_trajectory(&mut file, trajectory)?;
    file.flush()
}

/// Read records back. The first line is always treated as the header.
pub fn read_trajectory<R: BufRead>(reader: R) -> Result<Vec<TrajectoryRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let line_no = idx + 1;
        let mut cols = [0.0; COLUMNS];
        let mut count = 0;
        for field in trimmed.split(',') {
            if count == COLUMNS {
                count += 1;
                break;
            }
            cols[count] = field.trim().parse::<f64>().map_err(|e| SimError::Parse {
                line: line_no,
                message: format!("'{}': {e}", field.trim()),
            })?;
            count += 1;
        }
        if count != COLUMNS {
            return Err(SimError::Parse {
                line: line_no,
                message: format!("expected {COLUMNS} columns"),
            });
        }
        records.push(TrajectoryRecord::from_columns(cols));
    }
    Ok(records)
}

pub fn read_trajectory_file(path: impl AsRef<Path>) -> Result<Vec<TrajectoryRecord>> {
    let file = File::open(path)?;
    read_trajectory(BufReader::new(file))
}
