// Converter selection
use docexec_core::domain::{ConverterConfig, ConverterKind};
use docexec_core::port::DocumentConverter;

use crate::libreoffice::LibreOfficeConverter;

/// Build the converter named by `config.kind`
pub fn converter_for(config: &ConverterConfig) -> Box<dyn DocumentConverter> {
    match config.kind {
        ConverterKind::LibreOffice => Box::new(LibreOfficeConverter::new(config.clone())),
    }
}
