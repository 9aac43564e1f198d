use rulexcel::platform::desktop::dirs::default_webview_data_dir;

fn main() {
    env_logger::init();

    let webview_data_dir = match default_webview_data_dir() {
        Ok(dir) => dir,
        Err(err) => {
            log::error!("failed to prepare webview data directory: {err:#}");
            std::process::exit(1);
        }
    };

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title(rulexcel::APP_TITLE))
                .with_data_directory(webview_data_dir),
        )
        .launch(rulexcel::app::App);
}
