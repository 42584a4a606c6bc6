//! `bomkit`: command-line front end of the BOM pipeline.
//!
//! One subcommand per stage plus `run`, which chains every stage from a TOML
//! configuration file. `RUST_LOG` overrides the default `info` log level.

use std::path::PathBuf;

use bomkit_bom::conf::{C_REPORT_SHEET, SpecWrapLimits};
use bomkit_bom::{
    EnumExtractVariant, ReportStage, SpecSourceDoc, SpecStageIo, load_pipeline_config, run_classify,
    run_compress, run_format, run_parse, run_pipeline, run_sort, run_split, run_wrap,
};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Turn specification documents into a purchased-items report.
#[derive(Parser)]
#[command(name = "bomkit")]
#[command(about = "BOM extraction, classification and report pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Extractor flavour on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArgVariant {
    /// Numeric positions only; materials reset the section.
    Basic,
    /// Dash positions allowed; materials end the document.
    Extended,
}

impl From<ArgVariant> for EnumExtractVariant {
    fn from(value: ArgVariant) -> Self {
        match value {
            ArgVariant::Basic => Self::Basic,
            ArgVariant::Extended => Self::Extended,
        }
    }
}

/// Input/output of a sheet-to-sheet stage.
#[derive(Args)]
struct StageArgs {
    /// Input workbook.
    #[arg(long)]
    input: PathBuf,

    /// Output workbook.
    #[arg(long)]
    output: PathBuf,

    /// Sheet to read and write.
    #[arg(long, default_value = "BOM")]
    sheet: String,
}

impl StageArgs {
    fn to_io(&self) -> SpecStageIo {
        SpecStageIo::new(&self.input, &self.output, &self.sheet)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract BOM rows from `.docx` specification tables.
    Parse {
        /// Source document and its module code, `path=module`; repeatable.
        #[arg(long = "doc", required = true, value_parser = parse_source_doc)]
        docs: Vec<SpecSourceDoc>,

        #[arg(long, value_enum, default_value_t = ArgVariant::Extended)]
        variant: ArgVariant,

        /// Output workbook.
        #[arg(long, default_value = "BOMs_parsed.xlsx")]
        output: PathBuf,

        /// Output sheet name.
        #[arg(long, default_value = "BOM")]
        sheet: String,
    },

    /// Add the `Category` column.
    Classify(StageArgs),

    /// Sort rows by category and domain key.
    Sort(StageArgs),

    /// Collapse runs of equal names into groups with subtotals.
    Compress(StageArgs),

    /// Split names into `Name_Clean` and `SupplyDoc`.
    Split(StageArgs),

    /// Build the purchased-items report.
    Format(StageArgs),

    /// Word-wrap the report across rows.
    Wrap {
        /// Report workbook.
        #[arg(long)]
        input: PathBuf,

        /// Wrapped workbook.
        #[arg(long)]
        output: PathBuf,

        /// Report sheet name.
        #[arg(long, default_value = C_REPORT_SHEET)]
        sheet: String,

        /// Characters per line of the name column.
        #[arg(long, default_value_t = SpecWrapLimits::default().name)]
        name_width: usize,

        /// Characters per line of the supply-document column.
        #[arg(long, default_value_t = SpecWrapLimits::default().supply_doc)]
        supply_doc_width: usize,

        /// Characters per line of the comment column.
        #[arg(long, default_value_t = SpecWrapLimits::default().comment)]
        comment_width: usize,
    },

    /// Run every stage from a TOML configuration.
    Run {
        /// Pipeline configuration file.
        #[arg(long, default_value = "bomkit.toml")]
        config: PathBuf,
    },
}

fn parse_source_doc(value: &str) -> Result<SpecSourceDoc, String> {
    let (c_path, c_module) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected path=module, got {value:?}"))?;
    if c_path.trim().is_empty() || c_module.trim().is_empty() {
        return Err(format!("expected path=module, got {value:?}"));
    }
    Ok(SpecSourceDoc {
        path: PathBuf::from(c_path.trim()),
        module: c_module.trim().to_string(),
    })
}

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(c_filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&c_filters);
    }
    builder.init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let l_reports: Vec<ReportStage> = match cli.command {
        Commands::Parse {
            docs,
            variant,
            output,
            sheet,
        } => vec![run_parse(&docs, variant.into(), &output, &sheet)?],
        Commands::Classify(args) => vec![run_classify(&args.to_io())?],
        Commands::Sort(args) => vec![run_sort(&args.to_io())?],
        Commands::Compress(args) => vec![run_compress(&args.to_io())?],
        Commands::Split(args) => vec![run_split(&args.to_io())?],
        Commands::Format(args) => {
            let mut io = args.to_io();
            io.sheet_out = C_REPORT_SHEET.to_string();
            vec![run_format(&io)?]
        }
        Commands::Wrap {
            input,
            output,
            sheet,
            name_width,
            supply_doc_width,
            comment_width,
        } => {
            let limits = SpecWrapLimits {
                name: name_width,
                supply_doc: supply_doc_width,
                comment: comment_width,
            };
            vec![run_wrap(&SpecStageIo::new(input, output, &sheet), limits)?]
        }
        Commands::Run { config } => {
            let cfg = load_pipeline_config(&config)?;
            run_pipeline(&cfg)?
        }
    };

    for report in &l_reports {
        println!("{report}");
        for c_warning in &report.warnings {
            println!("  warning: {c_warning}");
        }
    }
    Ok(())
}
