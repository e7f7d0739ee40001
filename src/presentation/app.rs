use crate::domain::gallery::{GalleryUiState, PhotoSource};
use crate::domain::models::{BleEvent, BluetoothCommand, GalleryCommand, StatusMessage, Tab};
use crate::domain::settings::{GallerySettings, SettingsService};
use crate::domain::web::WebPage;
use crate::error::GalleryError;
use crate::infrastructure::bluetooth::BluetoothService;
use crate::infrastructure::logging::{init_logger, LoggingGuard};
use crate::infrastructure::text_fetch::run_text_worker;
use crate::infrastructure::unsplash::{
    api::UnsplashApi, worker::run_gallery_worker, UnsplashRepository,
};
use crate::presentation::tabs::{
    self, bluetooth::BluetoothScreen, gallery::GalleryScreen, network::NetworkScreen,
};
use crate::presentation::theme;
use eframe::egui;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct ShellyApp {
    pub(crate) settings: Arc<Mutex<SettingsService>>,

    // Background services
    pub(crate) bluetooth_tx: mpsc::UnboundedSender<BluetoothCommand>,
    pub(crate) ble_event_rx: mpsc::UnboundedReceiver<BleEvent>,
    pub(crate) gallery_tx: mpsc::UnboundedSender<GalleryCommand>,
    pub(crate) gallery_state_rx: mpsc::UnboundedReceiver<GalleryUiState>,
    pub(crate) fetch_tx: mpsc::UnboundedSender<String>,
    pub(crate) fetch_result_rx: mpsc::UnboundedReceiver<Result<String, String>>,

    // Screens
    pub(crate) selected_tab: Tab,
    pub(crate) bluetooth: BluetoothScreen,
    pub(crate) gallery: GalleryScreen,
    pub(crate) web: WebPage,
    pub(crate) network: NetworkScreen,
    pub(crate) settings_status: Option<StatusMessage>,

    pub(crate) is_dark_mode: bool,

    pub(crate) _logging_guard: Option<LoggingGuard>,
}

impl ShellyApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let mut settings_service = SettingsService::new().unwrap_or_else(|e| {
            eprintln!("Settings unavailable, using defaults: {}", e);
            SettingsService::with_path(PathBuf::from("settings.json"))
        });

        let logging_guard = init_logger(&settings_service.get().log_settings)
            .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
            .ok();

        info!("Starting Shelly Toolkit");

        if let Err(e) = settings_service.ensure_session() {
            warn!("Could not persist guest session: {}", e);
        }

        let is_dark_mode = settings_service.get().dark_mode;
        theme::apply_theme(&cc.egui_ctx, is_dark_mode);

        let gallery_settings = settings_service.get().gallery.clone();
        let settings = Arc::new(Mutex::new(settings_service));

        let (ble_event_tx, ble_event_rx) = mpsc::unbounded_channel();
        let (bluetooth_tx, bluetooth_rx) = mpsc::unbounded_channel();
        spawn_bluetooth_thread(ble_event_tx, bluetooth_rx, settings.clone());

        let (gallery_tx, gallery_rx) = mpsc::unbounded_channel();
        let (gallery_state_tx, gallery_state_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (fetch_result_tx, fetch_result_rx) = mpsc::unbounded_channel();
        spawn_network_thread(
            gallery_settings,
            gallery_rx,
            gallery_state_tx,
            fetch_rx,
            fetch_result_tx,
        );

        Self {
            settings,
            bluetooth_tx,
            ble_event_rx,
            gallery_tx,
            gallery_state_rx,
            fetch_tx,
            fetch_result_rx,
            selected_tab: Tab::Home,
            bluetooth: BluetoothScreen::default(),
            gallery: GalleryScreen::default(),
            web: WebPage::default(),
            network: NetworkScreen::default(),
            settings_status: None,
            is_dark_mode,
            _logging_guard: logging_guard,
        }
    }

    pub(crate) fn go_home(&mut self) {
        self.selected_tab = Tab::Home;
    }

    pub(crate) fn send_bluetooth(&self, command: BluetoothCommand) {
        if self.bluetooth_tx.send(command).is_err() {
            error!("Bluetooth service is gone");
        }
    }

    pub(crate) fn send_gallery(&self, command: GalleryCommand) {
        if self.gallery_tx.send(command).is_err() {
            error!("Gallery worker is gone");
        }
    }

    pub(crate) fn send_fetch(&mut self, url: String) {
        if self.fetch_tx.send(url).is_err() {
            self.network
                .apply(Err("Network worker is not running".to_string()));
        }
    }

    pub(crate) fn sign_in_as_guest(&mut self) {
        if let Ok(mut settings) = self.settings.lock() {
            if let Err(e) = settings.ensure_session() {
                warn!("Could not persist guest session: {}", e);
            }
        }
    }

    fn toggle_dark_mode(&mut self, ctx: &egui::Context) {
        self.is_dark_mode = !self.is_dark_mode;
        theme::apply_theme(ctx, self.is_dark_mode);
        if let Ok(mut settings) = self.settings.lock() {
            settings.get_mut().dark_mode = self.is_dark_mode;
            if let Err(e) = settings.save() {
                warn!("Failed to save settings: {}", e);
            }
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.ble_event_rx.try_recv() {
            self.bluetooth.apply(event);
        }
        while let Ok(state) = self.gallery_state_rx.try_recv() {
            self.gallery.apply(state);
        }
        while let Ok(result) = self.fetch_result_rx.try_recv() {
            self.network.apply(result);
        }
    }
}

fn spawn_bluetooth_thread(
    events: mpsc::UnboundedSender<BleEvent>,
    commands: mpsc::UnboundedReceiver<BluetoothCommand>,
    settings: Arc<Mutex<SettingsService>>,
) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime for Bluetooth: {}", e);
                let _ = events.send(BleEvent::Message(format!("Bluetooth unavailable: {}", e)));
                return;
            }
        };

        rt.block_on(BluetoothService::new(events, settings).run(commands));
    });
}

fn spawn_network_thread(
    gallery: GallerySettings,
    gallery_commands: mpsc::UnboundedReceiver<GalleryCommand>,
    gallery_states: mpsc::UnboundedSender<GalleryUiState>,
    fetch_requests: mpsc::UnboundedReceiver<String>,
    fetch_results: mpsc::UnboundedSender<Result<String, String>>,
) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime for networking: {}", e);
                let _ = gallery_states.send(GalleryUiState::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        rt.block_on(async move {
            let page_size = gallery.page_size;
            let gallery_task = async {
                match photo_source(&gallery) {
                    Ok(source) => {
                        run_gallery_worker(source, page_size, gallery_commands, gallery_states)
                            .await
                    }
                    Err(e) => {
                        error!("Gallery unavailable: {}", e);
                        report_gallery_error(e, gallery_commands, gallery_states).await
                    }
                }
            };
            tokio::join!(gallery_task, run_text_worker(fetch_requests, fetch_results));
        });
    });
}

fn photo_source(gallery: &GallerySettings) -> Result<Arc<dyn PhotoSource>, GalleryError> {
    let api = UnsplashApi::new(&gallery.base_url, gallery.effective_access_key())?;
    Ok(Arc::new(UnsplashRepository::new(api)))
}

/// Answer every gallery command with the configuration error.
async fn report_gallery_error(
    e: GalleryError,
    mut commands: mpsc::UnboundedReceiver<GalleryCommand>,
    states: mpsc::UnboundedSender<GalleryUiState>,
) {
    let message = e.to_string();
    while let Some(command) = commands.recv().await {
        if command == GalleryCommand::Refresh {
            let _ = states.send(GalleryUiState::Error {
                message: message.clone(),
            });
        }
    }
}

impl eframe::App for ShellyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        // Keep polling the worker channels while idle
        ctx.request_repaint_after(Duration::from_millis(100));

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.selected_tab, Tab::Home, "Home");
                ui.selectable_value(&mut self.selected_tab, Tab::Bluetooth, "Bluetooth");
                ui.selectable_value(&mut self.selected_tab, Tab::Gallery, "Gallery");
                ui.selectable_value(&mut self.selected_tab, Tab::Web, "Web");
                ui.selectable_value(&mut self.selected_tab, Tab::Network, "Network");
                ui.selectable_value(&mut self.selected_tab, Tab::Settings, "Settings");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.toggle_dark_mode(ctx);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(800.0);
                    ui.add_space(20.0);

                    match self.selected_tab {
                        Tab::Home => tabs::home::render(self, ui),
                        Tab::Bluetooth => tabs::bluetooth::render(self, ui),
                        Tab::Gallery => tabs::gallery::render(self, ui),
                        Tab::Web => tabs::web::render(self, ui),
                        Tab::Network => tabs::network::render(self, ui),
                        Tab::Settings => tabs::settings::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });
    }
}

