//! Definición de la línea de comandos.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "metalens",
    version,
    about = "Inspector y limpiador de metadata de archivos, 100% local"
)]
pub struct Cli {
    /// Deshabilita los colores ANSI
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Aumenta la verbosidad (repetible)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Muestra la metadata detectada, sin modificar nada
    Inspect {
        #[arg(required = true)]
        targets: Vec<PathBuf>,

        /// Desciende recursivamente en los directorios
        #[arg(short, long)]
        recursive: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// Escribe un reporte a FILE (JSON, o CSV si la extensión es .csv)
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Elimina metadata según la política
    Strip {
        #[arg(required = true)]
        targets: Vec<PathBuf>,

        /// Desciende recursivamente en los directorios
        #[arg(short, long)]
        recursive: bool,

        /// Escribe los archivos limpios en DIR
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Sobrescribe los originales
        #[arg(long, conflicts_with = "out_dir")]
        in_place: bool,

        /// Muestra el plan sin tocar ningún archivo
        #[arg(long)]
        dry_run: bool,

        /// PDF: reemplaza el diccionario Info completo por `<<>>`
        #[arg(long)]
        wipe_info: bool,

        /// Escribe un reporte post-limpieza a FILE
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Describe los riesgos de un archivo
    Explain { target: PathBuf },

    /// Lista las políticas integradas, o muestra una en JSON
    Policy { name: Option<String> },
}

#[derive(Args, Clone, Debug)]
pub struct PolicyArgs {
    /// Usa la política integrada "safe" en lugar de "aggressive"
    #[arg(long)]
    pub safe: bool,

    /// Archivo de política JSON `{name, keep, drop}`
    #[arg(long, value_name = "FILE", conflicts_with = "safe")]
    pub policy: Option<PathBuf>,

    /// Patrón keep adicional (repetible)
    #[arg(long, value_name = "GLOB")]
    pub keep: Vec<String>,

    /// Patrón drop adicional (repetible)
    #[arg(long, value_name = "GLOB")]
    pub drop: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}
