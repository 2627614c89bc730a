//! Page-side entry point: annotates instructor names on the roster page.

use log::LevelFilter;

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    roster_ratings::logging::init(LevelFilter::Info);

    #[cfg(target_arch = "wasm32")]
    roster_ratings::web::page::start();

    #[cfg(not(target_arch = "wasm32"))]
    log::warn!("The roster annotator only runs inside a browser page");
}
