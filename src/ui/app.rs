use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use turnweaver::engine::engine;
use turnweaver::engine::protocol::{EngineCommand, EngineResponse};
use turnweaver::model::message::{Message, MessageKind};
use turnweaver::model::session::SessionState;
use turnweaver::TurnOrchestrator;

use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::load_settings;

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub input_text: String,
    pub topic_text: String,
    pub credential_text: String,

    /// Last state published by the engine.
    pub session: SessionState,

    pub notice: Option<String>,
    pub should_auto_scroll: bool,
    pub show_credential_window: bool,
}

/* =========================
   App
   ========================= */

pub struct TurnweaverApp {
    pub ui: UiState,
    pub settings: UiSettings,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl TurnweaverApp {
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        let (cmd_tx, resp_rx) = engine::spawn(orchestrator);

        Self {
            ui: UiState::default(),
            settings: load_settings(),
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::error!("Engine thread is gone; command dropped");
        }
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let bg = self.settings.color(msg.kind());
        let (right, text) = match msg.kind() {
            MessageKind::User => (true, format!("You: {}", msg.text())),
            MessageKind::Narrator => (false, msg.text().to_string()),
            MessageKind::System => (false, format!("ℹ {}", msg.text())),
            MessageKind::Error => (false, format!("⚠ {}", msg.text())),
        };

        ui.add_space(6.0);

        if right {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &text);
            });
        } else {
            bubble(ui, bg, &text);
        }
    }

    fn poll_engine(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            match resp {
                EngineResponse::SessionUpdated(state) => {
                    if state.transcript.len() != self.ui.session.transcript.len() {
                        self.ui.should_auto_scroll = true;
                    }
                    self.ui.session = state;
                }
                EngineResponse::CredentialRequested => {
                    self.ui.show_credential_window = true;
                }
                EngineResponse::Rejected(reason) => {
                    self.ui.notice = Some(reason);
                }
            }
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for TurnweaverApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);

        self.poll_engine();

        draw_left_panel(ctx, self);
        draw_center_panel(ctx, self);
        draw_credential_window(ctx, self);

        self.ui.should_auto_scroll = false;

        // Engine replies arrive from another thread; keep polling.
        ctx.request_repaint_after(Duration::from_millis(150));
    }
}

impl Drop for TurnweaverApp {
    fn drop(&mut self) {
        // The engine holds its own loopback sender, so it only stops on request.
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

/* =========================
   UI Helpers
   ========================= */

fn draw_credential_window(ctx: &egui::Context, app: &mut TurnweaverApp) {
    if !app.ui.show_credential_window {
        return;
    }

    let mut open = true;
    let mut submit = false;

    egui::Window::new("Update API settings")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label("API key");
            ui.add(
                egui::TextEdit::singleline(&mut app.ui.credential_text)
                    .password(true)
                    .hint_text("Paste your key"),
            );

            if ui.button("Apply and test").clicked() {
                submit = true;
            }
        });

    if submit {
        submit_credential(app);
        open = false;
    }

    app.ui.show_credential_window = open;
}

pub fn submit_credential(app: &mut TurnweaverApp) {
    let key = app.ui.credential_text.trim().to_string();
    app.send_command(EngineCommand::UpdateCredential(key));
    app.ui.credential_text.clear();
}

pub fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}
