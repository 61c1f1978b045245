use std::env;

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-env-changed=PDFIUM_LIB_DIR");
    println!("cargo:rerun-if-changed=build.rs");

    // Si el usuario ya apunta a su propia librería, no descargamos nada.
    if env::var_os("PDFIUM_LIB_DIR").is_some() {
        return Ok(());
    }

    // Solo en Windows: allí no hay PDFium "de sistema" que enlazar en runtime.
    #[cfg(target_os = "windows")]
    {
        setup_pdfium()?;
    }

    Ok(())
}

#[cfg(target_os = "windows")]
fn setup_pdfium() -> anyhow::Result<()> {
    use anyhow::Context;
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;

    // Última versión estable para Windows x64 (el .zip evita depender de tar/gz).
    const PDFIUM_URL: &str =
        "https://github.com/bblanchon/pdfium-binaries/releases/latest/download/pdfium-win-x64.zip";
    const DLL_NAME: &str = "pdfium.dll";

    // Junto al manifest: PdfiumEngine::bind prueba "./" antes que el sistema.
    let root_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let dll_path = root_dir.join(DLL_NAME);

    if dll_path.exists() {
        return Ok(());
    }

    println!("cargo:warning=Descargando PDFium desde {}...", PDFIUM_URL);

    let response = reqwest::blocking::get(PDFIUM_URL)
        .context("Fallo al descargar PDFium")?
        .bytes()
        .context("Fallo al leer bytes del ZIP")?;

    let mut zip = zip::ZipArchive::new(Cursor::new(response)).context("Fallo al abrir el ZIP")?;

    // La DLL suele estar en bin/pdfium.dll; no dependemos de la ruta exacta.
    let index = (0..zip.len())
        .find(|&i| {
            zip.by_index(i)
                .map(|f| f.name().ends_with("bin/pdfium.dll") || f.name() == DLL_NAME)
                .unwrap_or(false)
        })
        .context("No se encontró pdfium.dll dentro del ZIP descargado")?;
    let mut dll_file = zip.by_index(index)?;

    let mut out_file = fs::File::create(&dll_path)
        .with_context(|| format!("Fallo al crear el archivo {:?}", dll_path))?;
    std::io::copy(&mut dll_file, &mut out_file).context("Fallo al extraer/escribir pdfium.dll")?;

    println!("cargo:warning=PDFium instalado en: {:?}", dll_path);
    Ok(())
}
