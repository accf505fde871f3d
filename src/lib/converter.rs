//! The external binary/text converter.
//!
//! Conversions go through fontTools `ttx` (or a compatible program), which picks the
//! direction from the input file: a binary font is dumped to TTX, a TTX document is
//! compiled to a binary font. Either way the command line is
//! `<program> <args...> -o <output> <input>`.

use crate::config::ConverterConfig;
use crate::ReindexError;
use log::{debug, info};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct Converter {
    program: String,
    args: Vec<String>,
}

impl Converter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Converter {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Converter::new(config.program.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("-o").arg(output).arg(input);
        cmd
    }

    /// Convert `input` into `output`, waiting for the converter to finish.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<(), ReindexError> {
        debug!(
            "Running {} {:?} -o {:?} {:?}",
            self.program, self.args, output, input
        );
        let result = self.command(input, output).output().map_err(|e| {
            ReindexError::Converter {
                program: self.program.clone(),
                message: format!(
                    "failed to start converter: {} (is fontTools installed? pip install fonttools)",
                    e
                ),
                stderr: None,
            }
        })?;

        if !result.status.success() {
            return Err(ReindexError::Converter {
                program: self.program.clone(),
                message: format!("converting {:?} failed with {}", input, result.status),
                stderr: Some(String::from_utf8_lossy(&result.stderr).into_owned()),
            });
        }
        info!("Converted {:?} -> {:?}", input, output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let converter = Converter::new("ttx", vec!["-q".to_string()]);
        let cmd = converter.command(Path::new("in.ttf"), Path::new("out.ttx"));
        assert_eq!(cmd.get_program(), "ttx");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-q", "-o", "out.ttx", "in.ttf"]);
    }

    #[test]
    fn test_from_config() {
        let config = ConverterConfig {
            program: "/opt/fonttools/bin/ttx".to_string(),
            args: vec!["-q".to_string()],
            keep_intermediate: true,
        };
        let converter = Converter::from_config(&config);
        assert_eq!(converter.program(), "/opt/fonttools/bin/ttx");
        let cmd = converter.command(Path::new("a.ttx"), Path::new("a.ttf"));
        assert_eq!(cmd.get_args().count(), 4);
    }

    #[test]
    fn test_missing_program_is_a_converter_error() {
        let converter = Converter::new("ttfreindex-no-such-converter", Vec::new());
        let err = converter
            .convert(Path::new("in.ttf"), Path::new("out.ttx"))
            .unwrap_err();
        match err {
            ReindexError::Converter { program, .. } => {
                assert_eq!(program, "ttfreindex-no-such-converter")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_a_converter_error() {
        let converter = Converter::new("false", Vec::new());
        let err = converter
            .convert(Path::new("in.ttf"), Path::new("out.ttx"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Converter Error: converting"));
    }
}
