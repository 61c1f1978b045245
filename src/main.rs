use clap::Parser;
use pdf2image::config::Args;

fn main() -> anyhow::Result<()> {
    // Nivel info por defecto para ver el progreso; RUST_LOG lo sobreescribe.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Argumentos que faltan o no son válidos: clap imprime el uso y sale con código 2.
    let args = Args::parse();

    pdf2image::app::run(&args)
}
