//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::engine::{compile_sql, Session};
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::types::EngineKind;
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.command.unwrap_or(Commands::Run) {
            Commands::Run => self.run_job().await,
            Commands::Plan => self.plan(),
            Commands::Validate => self.validate(),
        }
    }

    /// Resolve the effective configuration
    fn load_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::resolve(self.cli.config.as_deref(), &self.cli.overrides())
    }

    /// Run the full job
    async fn run_job(&self) -> Result<()> {
        let config = self.load_config()?;
        let session = Session::from_config(&config)?;
        let pipeline = Pipeline::from_config(config)?;

        let summary = pipeline.run(&session).await?;
        self.output_message(&json!({
            "type": "SUMMARY",
            "summary": summary,
        }));
        Ok(())
    }

    /// Print transformation graphs without executing them
    fn plan(&self) -> Result<()> {
        let config = self.load_config()?;
        let session = Session::from_config(&config)?;
        let pipeline = Pipeline::from_config(config)?;

        for (table, frame) in pipeline.graphs(&session) {
            let schema = frame.schema()?;
            let columns: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
            let sink = pipeline.sink(table);
            let mut msg = json!({
                "type": "PLAN",
                "table": table,
                "location": sink.location.url(),
                "partition_by": sink.partition_by,
                "columns": columns,
                "plan": frame.explain(),
            });
            if pipeline.config().engine == EngineKind::Duckdb {
                msg["sql"] = Value::String(compile_sql(frame.plan())?);
            }
            self.output_message(&msg);
        }
        Ok(())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Configuration is valid: {} -> {} using {} engine",
                    config.input_base,
                    config.output_base,
                    config.engine
                )
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
