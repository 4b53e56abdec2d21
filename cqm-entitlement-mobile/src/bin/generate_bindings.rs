//! Generate Swift/Kotlin/Python bindings for cqm-entitlement-mobile from a
//! compiled library (uniffi 0.29 library mode).

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use uniffi_bindgen::bindings::{
    KotlinBindingGenerator, PythonBindingGenerator, SwiftBindingGenerator,
};
use uniffi_bindgen::BindingGenerator;

#[derive(Parser)]
#[command(name = "generate-bindings")]
#[command(about = "Generate UniFFI bindings for cqm-entitlement-mobile")]
struct Cli {
    /// Path to the compiled library (.dylib, .so, or .a file)
    #[arg(long, default_value = "../target/release/libcqm_entitlement_mobile.dylib")]
    library: Utf8PathBuf,

    /// Output language
    #[arg(short = 'l', long = "language", default_value = "swift")]
    language: Language,

    /// Output directory, defaults to `<language>/generated`
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Language {
    Swift,
    Kotlin,
    Python,
}

impl Language {
    fn dir_name(self) -> &'static str {
        match self {
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Python => "python",
        }
    }
}

fn generate<G: BindingGenerator>(
    library: &Utf8Path,
    generator: &G,
    out_dir: &Utf8Path,
) -> anyhow::Result<()> {
    uniffi_bindgen::library_mode::generate_bindings(
        library,
        None,
        generator,
        &uniffi_bindgen::EmptyCrateConfigSupplier,
        None,
        out_dir,
        false,
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let out_dir = cli
        .out_dir
        .unwrap_or_else(|| Utf8PathBuf::from(cli.language.dir_name()).join("generated"));

    if !cli.library.exists() {
        anyhow::bail!("Library not found: {}", cli.library);
    }
    std::fs::create_dir_all(&out_dir)?;

    println!(
        "Generating {} bindings from {} into {}",
        cli.language.dir_name(),
        cli.library,
        out_dir
    );

    match cli.language {
        Language::Swift => generate(&cli.library, &SwiftBindingGenerator, &out_dir)?,
        Language::Kotlin => generate(&cli.library, &KotlinBindingGenerator, &out_dir)?,
        Language::Python => generate(&cli.library, &PythonBindingGenerator, &out_dir)?,
    }

    println!("Bindings generated.");
    Ok(())
}
