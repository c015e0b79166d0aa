use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;

use librivet::align::PairwiseAlignment;
use librivet::msa::Msa;
use librivet::output::output_tabular::{TableFormat, DEFAULT_FIELDS};

use crate::args::OutputArgs;
use crate::predict::CommandPredictor;
use crate::util::PathBufExt;

pub enum HeaderStatus {
    Unwritten,
    Written,
}

pub struct OutputStep {
    table_writer: Box<dyn Write + Send>,
    table_format: TableFormat,
    header_status: HeaderStatus,
    msa_dir_path: Option<PathBuf>,
    predictor: Option<CommandPredictor>,
}

impl OutputStep {
    pub fn new(args: &OutputArgs) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&args.msa_dir_path).context(format!(
            "failed to create MSA directory: {}",
            args.msa_dir_path.to_string_lossy()
        ))?;

        let predictor = match &args.predict_command {
            Some(template) => Some(CommandPredictor::new(template)?),
            None => None,
        };

        Ok(Self {
            table_writer: Box::new(args.tbl_results_path.open(true)?),
            table_format: TableFormat::new(&DEFAULT_FIELDS)?,
            header_status: HeaderStatus::Unwritten,
            msa_dir_path: Some(args.msa_dir_path.clone()),
            predictor,
        })
    }

    /// An output step that discards the hit table and writes no MSA
    /// files, for exercising the pipeline without touching the disk.
    #[cfg(test)]
    pub fn sink() -> anyhow::Result<Self> {
        Ok(Self {
            table_writer: Box::new(std::io::sink()),
            table_format: TableFormat::new(&DEFAULT_FIELDS)?,
            header_status: HeaderStatus::Unwritten,
            msa_dir_path: None,
            predictor: None,
        })
    }

    pub fn write(&mut self, hits: &[PairwiseAlignment], msa: &Msa) -> anyhow::Result<()> {
        self.table_format.reset_widths();
        hits.iter()
            .for_each(|hit| self.table_format.update_widths(hit));

        if let HeaderStatus::Unwritten = self.header_status {
            let header = TableFormat::header(&self.table_format)?;
            writeln!(self.table_writer, "{header}")?;
            self.header_status = HeaderStatus::Written;
        }

        hits.iter().try_for_each(|hit| {
            writeln!(self.table_writer, "{}", self.table_format.row_string(hit))
        })?;

        if let Some(dir) = &self.msa_dir_path {
            let msa_path = dir.join(format!("{}.a3m", msa.query_name));
            let mut msa_writer = msa_path.open(true)?;
            msa.write_a3m(&mut msa_writer)?;
            msa_writer.flush()?;

            if let Some(predictor) = &self.predictor {
                predictor.run(&msa_path)?;
            }
        }

        Ok(())
    }
}
