use eframe::egui;

use turnweaver::engine::protocol::EngineCommand;

use super::app::TurnweaverApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut TurnweaverApp) {
    let input_id = egui::Id::new("chat_input_box");
    let awaiting = app.ui.session.awaiting_response;

    // ---------- Choices + input bar ----------
    egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
        if !app.ui.session.has_started() {
            draw_topic_bar(ui, app);
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for choice in app.ui.session.choices.clone() {
                if ui.add_enabled(!awaiting, egui::Button::new(choice.text.as_str())).clicked() {
                    app.send_command(EngineCommand::SelectChoice(choice));
                }
            }
        });

        ui.separator();

        let mut send_now = false;

        ui.horizontal(|ui| {
            let response = ui.add_sized(
                [ui.available_width() - 60.0, 40.0],
                egui::TextEdit::multiline(&mut app.ui.input_text)
                    .id(input_id)
                    .hint_text("Or type your own action…")
                    .lock_focus(true),
            );

            // Enter vs Shift+Enter
            if response.has_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift)
            {
                send_now = true;
            }

            if ui.add_enabled(!awaiting, egui::Button::new("Send")).clicked() {
                send_now = true;
            }
        });

        if send_now && !awaiting {
            let text = app.ui.input_text.trim().to_string();

            if !text.is_empty() {
                app.send_command(EngineCommand::TakeTurn(text));
                app.ui.input_text.clear();
            }

            ui.memory_mut(|m| m.request_focus(input_id));
        }
    });

    // ---------- Transcript ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in &app.ui.session.transcript {
                    app.draw_message(ui, msg);
                }

                if awaiting {
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("The story continues…");
                    });
                }
            });
    });
}

fn draw_topic_bar(ui: &mut egui::Ui, app: &mut TurnweaverApp) {
    ui.label("What should the adventure be about?");

    ui.horizontal(|ui| {
        ui.add_sized(
            [ui.available_width() - 80.0, 24.0],
            egui::TextEdit::singleline(&mut app.ui.topic_text)
                .hint_text("e.g. medieval fantasy"),
        );

        let topic = app.ui.topic_text.trim().to_string();
        if ui.add_enabled(!topic.is_empty(), egui::Button::new("Begin")).clicked() {
            app.send_command(EngineCommand::StartSession(topic));
            app.ui.notice = None;
        }
    });
}
