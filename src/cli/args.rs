use crate::catalog::{MeasurementQuery, SiteQuery};
use crate::models::{RawBounds, RawSelection};
use crate::processors::EmptyResultPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "man-export")]
#[command(about = "Maritime Aerosol Network data export tool")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Only log warnings and errors; hide progress"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export matching data files as a tar.gz archive
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(
            short,
            long,
            help = "Where to write the archive [default: {timestamp}_MAN_DATA.tar.gz]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Source data root (overrides settings)")]
        source_root: Option<PathBuf>,

        #[arg(long, help = "Base directory for staging (overrides settings)")]
        temp_base: Option<PathBuf>,

        #[arg(long, help = "Row filter worker count (overrides settings)")]
        max_workers: Option<usize>,

        #[arg(long, help = "keep-original or header-only (overrides settings)")]
        empty_result: Option<EmptyResultPolicy>,
    },

    /// List sites from a catalog file
    Sites {
        #[arg(long, help = "Catalog JSON file")]
        catalog: PathBuf,

        #[command(flatten)]
        bounds: BoundsArgs,

        #[arg(long, help = "YYYY-MM-DD")]
        start_date: Option<String>,

        #[arg(long, help = "YYYY-MM-DD")]
        end_date: Option<String>,

        #[arg(long, help = "Derive span dates from measurements first")]
        recompute_spans: bool,
    },

    /// List measurements of selected sites from a catalog file
    Measurements {
        #[arg(long, help = "Catalog JSON file")]
        catalog: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        sites: Vec<String>,

        #[command(flatten)]
        bounds: BoundsArgs,

        #[arg(long, help = "YYYY-MM-DD")]
        start_date: Option<String>,

        #[arg(long, help = "YYYY-MM-DD")]
        end_date: Option<String>,

        #[arg(long, help = "Reading exposed as value [default: aod_500nm]")]
        reading: Option<String>,
    },
}

/// Bounding box, kept as text until a stage needs the numbers
#[derive(Args, Debug, Clone, Default)]
pub struct BoundsArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub min_lat: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub min_lng: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub max_lat: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub max_lng: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    #[arg(long, value_delimiter = ',', help = "Site names")]
    pub sites: Vec<String>,

    #[arg(long, help = "YYYY-MM-DD; 2004-10-16 means unbounded")]
    pub start_date: Option<String>,

    #[arg(long, help = "YYYY-MM-DD; today means unbounded")]
    pub end_date: Option<String>,

    #[arg(long = "retrievals", value_delimiter = ',', help = "AOD, SDA")]
    pub retrievals: Vec<String>,

    #[arg(long = "frequency", value_delimiter = ',', help = "Series, Point, Daily")]
    pub frequencies: Vec<String>,

    #[arg(
        long = "quality",
        value_delimiter = ',',
        help = "Level 1.0, Level 1.5, Level 2.0"
    )]
    pub qualities: Vec<String>,

    #[command(flatten)]
    pub bounds: BoundsArgs,
}

impl From<BoundsArgs> for RawBounds {
    fn from(args: BoundsArgs) -> Self {
        RawBounds {
            min_lat: args.min_lat,
            min_lng: args.min_lng,
            max_lat: args.max_lat,
            max_lng: args.max_lng,
        }
    }
}

impl From<SelectionArgs> for RawSelection {
    fn from(args: SelectionArgs) -> Self {
        RawSelection {
            sites: args.sites,
            start_date: args.start_date,
            end_date: args.end_date,
            retrievals: args.retrievals,
            frequencies: args.frequencies,
            qualities: args.qualities,
            bounds: args.bounds.into(),
        }
    }
}

impl SelectionArgs {
    pub fn into_raw(self) -> RawSelection {
        self.into()
    }
}

pub fn site_query(bounds: BoundsArgs, start_date: Option<String>, end_date: Option<String>) -> SiteQuery {
    SiteQuery {
        bounds: bounds.into(),
        start_date,
        end_date,
    }
}

pub fn measurement_query(
    sites: Vec<String>,
    bounds: BoundsArgs,
    start_date: Option<String>,
    end_date: Option<String>,
    reading: Option<String>,
) -> MeasurementQuery {
    MeasurementQuery {
        sites,
        bounds: bounds.into(),
        start_date,
        end_date,
        reading,
    }
}
