//! Transcript purifier window — egui/eframe application.
//!
//! # Architecture
//!
//! [`PurifierApp`] is the top-level [`eframe::App`].  It owns the
//! [`SessionController`] and two channel endpoints:
//!
//! * `command_tx` — sends [`SessionCommand`] to the background worker.
//! * `event_rx`   — receives [`SessionEvent`] from the worker.
//!
//! # Screens
//!
//! | Status | View |
//! |--------|------|
//! | `Idle` | Drop zone + path field, supported formats |
//! | `Reviewing` | Hints panel, original / purified tabs, correction highlighting |
//! | `Loading` | Reviewing view under a spinner overlay |

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use crate::annotate::Segment;
use crate::config::AppConfig;
use crate::document::SUPPORTED_EXTENSIONS;
use crate::llm::{Correction, PurifyError};
use crate::session::{
    write_export, ResetOutcome, SessionCommand, SessionController, SessionEvent, SessionStatus,
};

// ---------------------------------------------------------------------------
// Colours
// ---------------------------------------------------------------------------

const ACCENT: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);
const DANGER: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const MUTED: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);
const OK: egui::Color32 = egui::Color32::from_rgb(34, 197, 94);

/// Which text the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Original,
    Purified,
}

// ---------------------------------------------------------------------------
// PurifierApp
// ---------------------------------------------------------------------------

/// The transcript purifier window.
pub struct PurifierApp {
    // ── Session ──────────────────────────────────────────────────────────
    controller: SessionController,

    // ── UI state ─────────────────────────────────────────────────────────
    /// Path typed into the open-file field.
    path_input: String,
    tab: Tab,
    /// Highlight corrections instead of showing the editable text.
    show_diff: bool,
    /// Last export result, shown in the footer.
    notice: Option<String>,
    /// Directory exports are written to.
    export_dir: PathBuf,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<SessionCommand>,
    event_rx: mpsc::Receiver<SessionEvent>,

    // ── Configuration ────────────────────────────────────────────────────
    config: AppConfig,
}

impl PurifierApp {
    /// Create a new [`PurifierApp`].
    ///
    /// * `command_tx` — sender end of the worker command channel.
    /// * `event_rx`   — receiver end of the worker event channel.
    /// * `config`     — loaded application configuration.
    /// * `export_dir` — where exported transcripts are written.
    pub fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        event_rx: mpsc::Receiver<SessionEvent>,
        config: AppConfig,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            controller: SessionController::new(config.session.clone()),
            path_input: String::new(),
            tab: Tab::Purified,
            show_diff: config.ui.show_diff,
            notice: None,
            export_dir,
            command_tx,
            event_rx,
            config,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending worker events (non-blocking).
    fn poll_events(&mut self, now: Instant) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SessionEvent::Loaded(doc) => {
                    self.controller.apply_loaded(doc);
                    self.tab = Tab::Original;
                    self.notice = None;
                }
                SessionEvent::LoadFailed(err) => self.controller.apply_load_failed(&err),
                SessionEvent::Purified {
                    generation,
                    outcome,
                } => {
                    let succeeded = outcome.is_ok();
                    if self.controller.finish_purify(generation, outcome, now) && succeeded {
                        self.tab = Tab::Purified;
                    }
                }
            }
        }
    }

    /// Hand dropped files to the worker; only the first one is used.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        if let Some(path) = file.path {
            self.request_load(SessionCommand::Load { path });
        } else if let Some(bytes) = file.bytes {
            self.request_load(SessionCommand::LoadBytes {
                name: file.name,
                bytes,
            });
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    fn request_load(&mut self, command: SessionCommand) {
        if self.controller.state().status.is_busy() || self.controller.file_pending() {
            log::debug!("app: ignoring file while busy");
            return;
        }
        self.controller.begin_load();
        if self.command_tx.try_send(command).is_err() {
            self.controller
                .apply_load_failed(&crate::document::DocumentError::ExtractionFailed(
                    "background worker is not running".into(),
                ));
        }
    }

    fn request_purify(&mut self) {
        let ticket = match self.controller.begin_purify() {
            Ok(ticket) => ticket,
            Err(refused) => {
                log::debug!("app: purify refused: {refused}");
                return;
            }
        };

        let generation = ticket.generation;
        if self
            .command_tx
            .try_send(SessionCommand::Purify(ticket))
            .is_err()
        {
            self.controller.finish_purify(
                generation,
                Err(PurifyError::RemoteCallFailed(
                    "background worker is not running".into(),
                )),
                Instant::now(),
            );
        }
    }

    fn request_reset(&mut self) {
        if self.controller.request_reset(Instant::now()) == ResetOutcome::Cleared {
            self.path_input.clear();
            self.tab = Tab::Purified;
            self.show_diff = self.config.ui.show_diff;
            self.notice = None;
        }
    }

    fn export(&mut self) {
        let result = write_export(
            self.controller.state(),
            self.controller.config(),
            &self.export_dir,
        );
        self.notice = Some(match result {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                log::warn!("app: export failed: {e:#}");
                format!("Export failed: {e:#}")
            }
        });
    }

    // ── Panels ───────────────────────────────────────────────────────────

    /// Title, export and reset controls.
    fn draw_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Transcript Purifier")
                        .strong()
                        .size(16.0),
                );
                ui.label(
                    egui::RichText::new(self.config.purifier.model.as_str())
                        .color(MUTED)
                        .size(10.0),
                );

                if self.controller.state().status == SessionStatus::Idle {
                    return;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let armed = self.controller.reset_armed();
                    let reset = if armed {
                        egui::Button::new(
                            egui::RichText::new("Confirm clear?").color(egui::Color32::WHITE),
                        )
                        .fill(DANGER)
                    } else {
                        egui::Button::new("Clear")
                    };
                    if ui.add(reset).clicked() {
                        self.request_reset();
                    }

                    if ui.button("Export").clicked() {
                        self.export();
                    }
                });
            });
            ui.add_space(6.0);
        });
    }

    /// File name, character count, status.
    fn draw_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let state = self.controller.state();
                let name = if state.file_name.is_empty() {
                    "No file"
                } else {
                    state.file_name.as_str()
                };
                ui.label(egui::RichText::new(name).color(MUTED).size(11.0));
                ui.label(
                    egui::RichText::new(format!("{} chars", self.controller.character_count()))
                        .color(MUTED)
                        .size(11.0),
                );
                if let Some(notice) = &self.notice {
                    ui.label(egui::RichText::new(notice.as_str()).size(11.0));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let dot = if state.error.is_some() { DANGER } else { OK };
                    ui.label(egui::RichText::new(state.status.label()).color(MUTED).size(11.0));
                    ui.label(egui::RichText::new("●").color(dot).size(11.0));
                });
            });
        });
    }

    /// Upload screen.
    fn draw_idle(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading(egui::RichText::new("High-fidelity transcript cleanup").size(28.0));
                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new(
                        "Removes filler words and transcription errors only; \
                         keeps the full argument and every detail.",
                    )
                    .color(MUTED),
                );
                ui.add_space(40.0);

                if self.controller.file_pending() {
                    ui.spinner();
                    ui.label("Processing file...");
                } else {
                    ui.label("Drop a transcript onto this window, or open one by path:");
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        let edit = ui.add(
                            egui::TextEdit::singleline(&mut self.path_input)
                                .hint_text("/path/to/transcript.docx")
                                .desired_width(360.0),
                        );
                        let enter =
                            edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if (ui.button("Open").clicked() || enter)
                            && !self.path_input.trim().is_empty()
                        {
                            let path = PathBuf::from(self.path_input.trim());
                            self.request_load(SessionCommand::Load { path });
                        }
                    });
                }

                ui.add_space(16.0);
                let formats: Vec<String> = SUPPORTED_EXTENSIONS
                    .iter()
                    .map(|e| format!(".{}", e.to_uppercase()))
                    .collect();
                ui.label(egui::RichText::new(formats.join("   ")).color(MUTED).size(11.0));

                if let Some(error) = self.controller.state().error.clone() {
                    ui.add_space(16.0);
                    ui.label(egui::RichText::new(error.message).color(DANGER));
                }
            });
        });
    }

    /// Hints editor, purify and clear buttons, uncertain parts.
    fn draw_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("hints_panel")
            .resizable(false)
            .exact_width(300.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Names & terminology").strong().color(ACCENT));
                ui.add_space(4.0);
                ui.add(
                    egui::TextEdit::multiline(self.controller.hints_mut())
                        .hint_text("e.g. 'Xiao Ming' should be 'Xiaoming', 'AI' means 'artificial intelligence'...")
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(12.0);

                let cooldown = self.controller.state().cooldown_secs;
                let label = if cooldown > 0 {
                    format!("Cooling down ({cooldown}s)")
                } else {
                    "Purify".to_string()
                };
                let purify = ui.add_enabled(
                    self.controller.can_purify(),
                    egui::Button::new(egui::RichText::new(label).strong())
                        .min_size(egui::vec2(ui.available_width(), 36.0)),
                );
                if purify.clicked() {
                    self.request_purify();
                }

                ui.add_space(6.0);
                let armed = self.controller.reset_armed();
                let text = if armed {
                    egui::RichText::new("Really clear the document?").color(egui::Color32::WHITE)
                } else {
                    egui::RichText::new("Clear document")
                };
                let mut clear =
                    egui::Button::new(text).min_size(egui::vec2(ui.available_width(), 30.0));
                if armed {
                    clear = clear.fill(DANGER);
                }
                if ui.add(clear).clicked() {
                    self.request_reset();
                }

                let uncertain = self
                    .controller
                    .state()
                    .purified
                    .as_ref()
                    .map(|r| r.uncertain_parts.clone())
                    .unwrap_or_default();
                if !uncertain.is_empty() {
                    ui.add_space(16.0);
                    ui.separator();
                    ui.label(egui::RichText::new("Uncertain parts").strong());
                    egui::ScrollArea::vertical()
                        .id_salt("uncertain")
                        .show(ui, |ui| {
                            for part in &uncertain {
                                ui.label(egui::RichText::new(format!("• {part}")).size(12.0));
                            }
                        });
                }
            });
    }

    /// Error banner, tabs and the document itself.
    fn draw_review(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = self.controller.state().error.clone() {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgb(254, 242, 242))
                    .corner_radius(egui::CornerRadius::same(6))
                    .inner_margin(egui::Margin::same(8))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.vertical(|ui| {
                                ui.label(
                                    egui::RichText::new(error.title())
                                        .strong()
                                        .color(DANGER),
                                );
                                ui.label(
                                    egui::RichText::new(error.message.as_str())
                                        .size(12.0)
                                        .color(DANGER),
                                );
                            });
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("Dismiss").clicked() {
                                        self.controller.dismiss_error();
                                    }
                                },
                            );
                        });
                    });
                ui.add_space(6.0);
            }

            let has_result = self.controller.state().purified.is_some();
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Original, "Original");
                ui.selectable_value(&mut self.tab, Tab::Purified, "Purified");
                if self.tab == Tab::Purified && has_result {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.checkbox(&mut self.show_diff, "Show corrections");
                    });
                }
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .id_salt("document")
                .auto_shrink([false, false])
                .show(ui, |ui| match self.tab {
                    Tab::Original => {
                        ui.add(
                            egui::TextEdit::multiline(self.controller.original_text_mut())
                                .desired_width(f32::INFINITY)
                                .desired_rows(30),
                        );
                    }
                    Tab::Purified if self.show_diff && has_result => {
                        draw_segments(ui, &self.controller.segments());
                    }
                    Tab::Purified => {
                        ui.add(
                            egui::TextEdit::multiline(self.controller.edited_text_mut())
                                .hint_text("Run a purification to see the cleaned-up text here.")
                                .desired_width(f32::INFINITY)
                                .desired_rows(30),
                        );
                    }
                });
        });
    }

    /// Spinner shown over the review screen while a purify call runs.
    fn draw_loading_overlay(&self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("loading_overlay"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Purifying the transcript, this can take a minute...");
                    });
                });
            });
    }
}

// ---------------------------------------------------------------------------
// Segment rendering
// ---------------------------------------------------------------------------

/// Render annotated text; hovering a correction shows what changed and why.
fn draw_segments(ui: &mut egui::Ui, segments: &[Segment<'_>]) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for segment in segments {
            match segment.correction() {
                None => {
                    for (i, line) in segment.text().split('\n').enumerate() {
                        if i > 0 {
                            ui.end_row();
                        }
                        if !line.is_empty() {
                            ui.label(line);
                        }
                    }
                }
                Some(correction) => {
                    ui.label(
                        egui::RichText::new(segment.text())
                            .strong()
                            .underline()
                            .color(ACCENT),
                    )
                    .on_hover_ui(|ui| correction_tooltip(ui, correction));
                }
            }
        }
    });
}

fn correction_tooltip(ui: &mut egui::Ui, correction: &Correction) {
    ui.label(egui::RichText::new("Change").color(MUTED).size(10.0));
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(correction.original.as_str())
                .strikethrough()
                .color(DANGER),
        );
        ui.label("→");
        ui.label(
            egui::RichText::new(correction.corrected.as_str())
                .strong()
                .color(ACCENT),
        );
    });
    ui.separator();
    ui.label(egui::RichText::new(correction.reason.as_str()).italics());
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for PurifierApp {
    /// Called every frame by eframe.  Polls the worker, advances timers, then
    /// renders the window.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // --- Poll worker and input ----------------------------------------
        self.poll_events(now);
        self.handle_dropped_files(ctx);
        self.controller.tick(now);

        // --- Schedule repaints while something is pending -----------------
        let state = self.controller.state();
        if state.status.is_busy() || self.controller.file_pending() {
            ctx.request_repaint_after(Duration::from_millis(66));
        } else if state.cooldown_secs > 0 || self.controller.reset_armed() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        // --- Render -------------------------------------------------------
        self.draw_top_bar(ctx);
        self.draw_footer(ctx);

        match self.controller.state().status {
            SessionStatus::Idle => self.draw_idle(ctx),
            SessionStatus::Reviewing => {
                self.draw_side_panel(ctx);
                self.draw_review(ctx);
            }
            SessionStatus::Loading => {
                self.draw_side_panel(ctx);
                self.draw_review(ctx);
                self.draw_loading_overlay(ctx);
            }
        }
    }

    /// Persist the correction-highlighting preference on exit (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("transcript purifier closing");
        self.config.ui.show_diff = self.show_diff;
        if let Err(e) = self.config.save() {
            log::warn!("app: failed to save settings: {e:#}");
        }
    }
}
