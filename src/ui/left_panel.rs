use eframe::egui;

use turnweaver::engine::protocol::EngineCommand;
use turnweaver::model::session::Mode;

use super::app::{submit_credential, TurnweaverApp};
use super::settings_io::save_settings;

pub fn draw_left_panel(ctx: &egui::Context, app: &mut TurnweaverApp) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Settings");
            ui.separator();

            ui.label("UI Scale");
            let scale = ui.add(egui::Slider::new(&mut app.settings.ui_scale, 0.75..=2.0));
            if scale.drag_stopped() {
                if let Err(e) = save_settings(&app.settings) {
                    log::warn!("Could not save UI settings: {e}");
                }
            }

            ui.separator();
            draw_backend_section(ui, app);

            ui.separator();
            if ui.button("Restart adventure").clicked() {
                app.send_command(EngineCommand::Restart);
                app.ui.topic_text.clear();
            }

            if let Some(notice) = &app.ui.notice {
                ui.separator();
                ui.label(egui::RichText::new(notice).italics());
            }
        });
}

fn draw_backend_section(ui: &mut egui::Ui, app: &mut TurnweaverApp) {
    ui.label("Story backend");

    let (label, color) = match (app.ui.session.mode, app.ui.session.demo_mode) {
        (Mode::Live, _) => ("● Live", egui::Color32::from_rgb(60, 160, 80)),
        (Mode::Fallback, true) => ("● Demo mode", egui::Color32::from_rgb(200, 160, 40)),
        (Mode::Fallback, false) => ("● Offline", egui::Color32::from_rgb(200, 80, 60)),
    };
    ui.label(egui::RichText::new(label).color(color));

    if let Some(err) = &app.ui.session.last_error {
        ui.label(egui::RichText::new(err).small());
    }

    ui.add_space(4.0);
    ui.label("API key");
    ui.add(
        egui::TextEdit::singleline(&mut app.ui.credential_text)
            .password(true)
            .hint_text("Paste your key"),
    );

    ui.horizontal(|ui| {
        if ui.button("Apply").clicked() {
            submit_credential(app);
        }
        if ui.button("Test").clicked() {
            app.send_command(EngineCommand::CheckConnectivity);
        }
    });
}
