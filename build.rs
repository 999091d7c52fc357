// Build script for WhatsApp Tray
// Embeds Windows resources (manifest)

fn main() {
    // Only run on Windows
    #[cfg(target_os = "windows")]
    {
        let rc_path = std::path::Path::new("resources/whatsapp-tray.rc");
        if rc_path.exists() {
            embed_resource::compile("resources/whatsapp-tray.rc", embed_resource::NONE);
        }

        println!("cargo:rustc-link-lib=user32");
        println!("cargo:rustc-link-lib=gdi32");
        println!("cargo:rustc-link-lib=shell32");
        println!("cargo:rustc-link-lib=advapi32");
    }

    println!("cargo:rerun-if-changed=resources/");
    println!("cargo:rerun-if-changed=build.rs");
}
