// Result Sink
// Writes exactly one result or error document per run

use crate::tree::Matrix;

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// `{"result": [[...]]}` or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultDocument {
    Result(Matrix),
    Error(String),
}

impl ResultDocument {
    pub fn from_outcome<E: Display>(outcome: Result<Matrix, E>) -> Self {
        match outcome {
            Ok(matrix) => ResultDocument::Result(matrix),
            Err(err) => ResultDocument::Error(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultDocument::Error(_))
    }

    /// Pretty-printed JSON followed by a newline
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}
