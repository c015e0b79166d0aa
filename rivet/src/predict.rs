use std::path::Path;
use std::process::Command;

use anyhow::Context;
use thiserror::Error;

use crate::util::CommandExt;

pub const MSA_PLACEHOLDER: &str = "{msa}";

#[derive(Error, Debug)]
#[error("predict command template does not contain the {MSA_PLACEHOLDER} placeholder: {template}")]
pub struct MissingMsaPlaceholderError {
    template: String,
}

/// Runs a user-supplied structure prediction command against each MSA
/// the pipeline writes. The command is a shell template in which
/// "{msa}" expands to the path of the MSA file.
#[derive(Clone, Debug)]
pub struct CommandPredictor {
    template: String,
}

impl CommandPredictor {
    pub fn new(template: &str) -> anyhow::Result<Self> {
        if !template.contains(MSA_PLACEHOLDER) {
            return Err(MissingMsaPlaceholderError {
                template: template.to_string(),
            }
            .into());
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn run(&self, msa_path: &Path) -> anyhow::Result<()> {
        let command_string = self
            .template
            .replace(MSA_PLACEHOLDER, &msa_path.to_string_lossy());

        Command::new("sh")
            .arg("-c")
            .arg(&command_string)
            .run()
            .context(format!("predict command failed: {command_string}"))
    }
}
