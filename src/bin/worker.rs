use log::LevelFilter;

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    roster_ratings::logging::init(LevelFilter::Info);

    #[cfg(target_arch = "wasm32")]
    {
        use roster_ratings::worker_agent::RatingTask;
        use yew_agent::Registrable;

        RatingTask::registrar().register();
    }
}
