fn main() {
    let gstreamer = std::env::var_os("CARGO_FEATURE_GSTREAMER").is_some();
    let macos = std::env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "macos");
    if gstreamer && macos {
        // Add the GStreamer framework directory to the library search path
        println!("cargo:rustc-link-search=framework=/Library/Frameworks");

        // Add an rpath to the GStreamer framework directory
        println!(
            "cargo:rustc-link-arg=-Wl,-rpath,/Library/Frameworks/GStreamer.framework/Versions/1.0/lib"
        );
    }
}
