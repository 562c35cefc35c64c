//! Command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, load configuration and start logging.
//! - Run exactly one operation through the core orchestrator.
//! - Print one status line per run step and render read rows.
//!
//! Exit code is 0 when the audit result is `Success`, 1 otherwise.

mod render;

use clap::{Parser, Subcommand};
use log::info;
use staffdb_core::config::DEFAULT_CONFIG_FILE;
use staffdb_core::{
    init_from_config, AuditRecord, AuditSink, AuditWriteMode, CsvAuditSink, Employee,
    EmployeeId, Operation, RunConfig, RunOrchestrator, Salary, SinkResult,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Transactional employee record store with a CSV audit trail.
#[derive(Parser, Debug)]
#[command(name = "staffdb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file (default: ./staffdb.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Fail instead of creating a missing database file
    #[arg(long, global = true)]
    no_create: bool,

    /// Audit CSV file
    #[arg(long, global = true)]
    audit_file: Option<PathBuf>,

    /// Replace the audit file instead of appending to it
    #[arg(long, global = true)]
    overwrite_audit: bool,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert one new employee
    Insert {
        #[arg(long, allow_negative_numbers = true)]
        id: EmployeeId,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        salary: Option<Salary>,
    },

    /// Read all employees in id order
    List {
        /// Also write the rows to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Number of rows to print
        #[arg(long, default_value_t = render::DEFAULT_SAMPLE_ROWS)]
        sample_rows: usize,
    },

    /// Set one employee's salary
    UpdateSalary {
        #[arg(long, allow_negative_numbers = true)]
        id: EmployeeId,
        #[arg(long, allow_negative_numbers = true)]
        salary: Salary,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (operation, sample_rows) = operation_of(&cli.command);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            if let Err(err) = record_config_failure(&cli, &operation) {
                eprintln!("error: audit trail not written: {err}");
            }
            return ExitCode::from(2);
        }
    };

    if let Err(message) = init_from_config(&config.logging) {
        eprintln!("warning: logging disabled: {message}");
    }

    info!(
        "event=cli_run module=cli status=start database={} audit_file={}",
        config.storage.database.display(),
        config.audit.file.display()
    );
    let orchestrator = RunOrchestrator::from_config(config);
    let report = orchestrator.run(&operation);

    for step in &report.steps {
        println!("[{}] {}", step.state, step.message);
    }
    if let (Some(max_rows), Some(table)) = (
        sample_rows,
        report.outcome.as_ref().and_then(|outcome| outcome.table()),
    ) {
        print!("{}", render::render_sample(table, max_rows));
    }
    if let Some(err) = &report.audit_error {
        eprintln!("error: audit trail not written: {err}");
    }
    println!("result: {}", report.status().as_str());

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn operation_of(command: &Command) -> (Operation, Option<usize>) {
    match command {
        Command::Insert {
            id,
            first_name,
            last_name,
            department,
            salary,
        } => {
            let mut employee = Employee::new(*id, first_name.clone(), last_name.clone());
            employee.department = department.clone();
            employee.salary = *salary;
            (Operation::InsertEmployee(employee), None)
        }
        Command::List { sample_rows, .. } => (Operation::SelectAllEmployees, Some(*sample_rows)),
        Command::UpdateSalary { id, salary } => (
            Operation::UpdateSalary {
                employee_id: *id,
                new_salary: *salary,
            },
            None,
        ),
    }
}

/// Writes a `Failure` audit row when no usable config could be loaded.
///
/// Only command-line overrides are known at this point; a file path set in
/// the unreadable config is not.
fn record_config_failure(cli: &Cli, operation: &Operation) -> SinkResult<AuditRecord> {
    let defaults = RunConfig::default().audit;
    let path = cli.audit_file.clone().unwrap_or(defaults.file);
    let mode = if cli.overwrite_audit {
        AuditWriteMode::Overwrite
    } else {
        defaults.mode
    };
    CsvAuditSink::new(path, mode).record(&operation.failure_entry())
}

fn load_config(cli: &Cli) -> Result<RunConfig, String> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path),
        None => RunConfig::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
    .map_err(|err| err.to_string())?;

    if let Some(database) = &cli.database {
        config.storage.database = database.clone();
    }
    if cli.no_create {
        config.storage.create_if_missing = false;
    }
    if let Some(audit_file) = &cli.audit_file {
        config.audit.file = audit_file.clone();
    }
    if cli.overwrite_audit {
        config.audit.mode = AuditWriteMode::Overwrite;
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = Some(level.clone());
    }
    if let Command::List {
        export: Some(path), ..
    } = &cli.command
    {
        config.export.file = Some(path.clone());
    }

    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}
