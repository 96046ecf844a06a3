use crate::{
    cli::Args,
    compiler::compile,
    constants::STDIN_INDICATOR,
    error::{Error, Result},
    ioutils::{parse_data_file, read_from, read_input, write_file},
    settings::TemplateSettings,
};
use std::io::Write;

/// CLI runner: load, compile, then render or print the source
pub struct Runner {
    args: Args,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    /// Executes the complete compile-and-render workflow
    pub fn run(self) -> Result<()> {
        if self.args.template == STDIN_INDICATOR
            && self.args.data.as_deref() == Some(STDIN_INDICATOR)
        {
            return Err(Error::StdinConflict);
        }

        let text = read_input(&self.args.template)?;
        let settings = self.load_settings()?;
        let template = compile(&text, Some(&settings))?;

        let output = if self.args.source {
            template.source().to_string()
        } else {
            let data = self.load_data()?;
            template.render(&data)?
        };

        self.write_output(&output)
    }

    /// Loads the settings file, then applies `--variable` on top
    fn load_settings(&self) -> Result<TemplateSettings> {
        let settings = match &self.args.settings {
            Some(path) => TemplateSettings::load(path)?,
            None => TemplateSettings::default(),
        };
        Ok(match &self.args.variable {
            Some(variable) => settings.with_variable(variable.as_str()),
            None => settings,
        })
    }

    /// Reads the data argument; an empty object when none is given
    fn load_data(&self) -> Result<serde_json::Value> {
        if let Some(path) = &self.args.data_file {
            log::debug!("Reading data from '{}'", path.display());
            return parse_data_file(path);
        }
        match self.args.data.as_deref() {
            Some(STDIN_INDICATOR) => Ok(serde_json::from_str(&read_from(std::io::stdin())?)?),
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(serde_json::Value::Object(serde_json::Map::new())),
        }
    }

    fn write_output(&self, output: &str) -> Result<()> {
        match &self.args.output {
            Some(path) => {
                write_file(output, path)?;
                log::info!("Wrote {} byte(s) to {}", output.len(), path.display());
                Ok(())
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(output.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}

/// Main entry point for CLI execution
pub fn run(args: Args) -> Result<()> {
    let runner = Runner::new(args);
    runner.run()
}
