// LibreOffice headless converter
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use docexec_core::domain::{
    Argument, ConversionError, ConversionPlan, ConversionRequest, ConverterConfig, ConverterKind,
};
use docexec_core::port::DocumentConverter;

use crate::validation;

/// Converts office documents with `libreoffice --headless --convert-to`
///
/// LibreOffice names its output `<outdir>/<input stem>.<ext>`; `finalize`
/// moves that file to the requested output path.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    config: ConverterConfig,
}

impl LibreOfficeConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Extension of the files the configured filter produces (`pdf:writer_pdf_Export` -> `pdf`)
    fn target_extension(&self) -> &str {
        self.config
            .filter
            .split(':')
            .next()
            .unwrap_or(&self.config.filter)
    }

    fn program_name(&self) -> String {
        self.config.binary.to_string_lossy().into_owned()
    }
}

#[async_trait]
impl DocumentConverter for LibreOfficeConverter {
    fn kind(&self) -> ConverterKind {
        ConverterKind::LibreOffice
    }

    fn prepare(&self, request: &ConversionRequest) -> Result<ConversionPlan, ConversionError> {
        validation::check_input(&request.input)?;
        validation::prepare_output_dir(&request.output)?;

        let program = self.program_name();
        let mut arguments = vec![Argument::flag("--headless")];

        let profile = request
            .profile_dir
            .as_ref()
            .or(self.config.profile_dir.as_ref());
        if let Some(profile) = profile {
            validation::prepare_profile_dir(&program, profile)?;
            let absolute = profile.canonicalize()?;
            arguments.push(Argument::option(
                "-env:UserInstallation=",
                format!("file://{}", absolute.display()),
            ));
        }

        let outdir = match request.output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        arguments.push(Argument::option("--convert-to", self.config.filter.as_str()));
        arguments.push(Argument::option(
            "--outdir",
            outdir.to_string_lossy().into_owned(),
        ));
        arguments.push(Argument::positional(
            request.input.to_string_lossy().into_owned(),
        ));

        let stem = request
            .input
            .file_stem()
            .ok_or_else(|| ConversionError::Validation("Input file has no name".into()))?;
        let produced = outdir.join(Path::new(stem).with_extension(self.target_extension()));

        debug!(
            input = %request.input.display(),
            produced = %produced.display(),
            "Planned LibreOffice conversion"
        );

        Ok(ConversionPlan {
            program: self.config.binary.clone(),
            arguments,
            produced,
            working_dir: None,
        })
    }

    async fn finalize(
        &self,
        request: &ConversionRequest,
        plan: &ConversionPlan,
    ) -> Result<PathBuf, ConversionError> {
        if !tokio::fs::try_exists(&plan.produced).await.unwrap_or(false) {
            return Err(ConversionError::MissingOutput(plan.produced.clone()));
        }
        if plan.produced != request.output {
            info!(
                from = %plan.produced.display(),
                to = %request.output.display(),
                "Moving converted document"
            );
            tokio::fs::rename(&plan.produced, &request.output).await?;
        }
        Ok(request.output.clone())
    }
}
