use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{SegmentClient, SegmentRequest, SessionImageRefs, UploadFile};
use crate::job::SubmissionController;
use crate::params::{Algorithm, GraphKind, ParamBinding, SegmentForm, WeightFn};
use crate::view::{ImageView, ViewToggle};

pub struct SegmentStudioApp {
    server_url: String,
    form: SegmentForm,
    upload: Option<UploadFile>,
    upload_path: Option<PathBuf>,
    controller: SubmissionController,
    view: ViewToggle,
    refs: Option<SessionImageRefs>,
    original_texture: Option<egui::TextureHandle>,
    result_texture: Option<egui::TextureHandle>,
    last_error: Option<String>,
}

impl SegmentStudioApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, server_url: String) -> Self {
        Self {
            server_url,
            form: SegmentForm::default(),
            upload: None,
            upload_path: None,
            controller: SubmissionController::new(),
            view: ViewToggle::new(),
            refs: None,
            original_texture: None,
            result_texture: None,
            last_error: None,
        }
    }

    fn open_image(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp"])
            .pick_file()
        {
            match crate::image_io::read_upload(&path) {
                Ok(upload) => {
                    // Local preview only; the session refs change on success.
                    if let Ok(img) = crate::image_io::decode_rgba(&upload.filename, &upload.bytes)
                    {
                        self.original_texture = Some(load_texture(ctx, "original", &img));
                        self.view.activate(ImageView::Original, ImageView::Result);
                    }
                    self.upload = Some(upload);
                    self.upload_path = Some(path);
                }
                Err(e) => {
                    log::warn!("could not read image: {e}");
                    self.last_error = Some(e.to_string());
                }
            }
        }
    }

    fn submit(&mut self) {
        self.last_error = None;
        // No client-side file check; a missing file is the server's error.
        let file = self.upload.clone().unwrap_or_default();
        let request = SegmentRequest {
            fields: self.form.fields(),
            file,
        };
        let client = SegmentClient::new(self.server_url.clone());
        self.controller.submit(client, request);
    }

    fn poll_job(&mut self, ctx: &egui::Context) {
        let Some(outcome) = self.controller.poll() else {
            return;
        };
        match outcome {
            Ok(artifacts) => {
                log::info!(
                    "segmentation finished: {} -> {}",
                    artifacts.refs.original,
                    artifacts.refs.result
                );
                self.original_texture =
                    Some(load_texture(ctx, "original", &artifacts.original));
                self.result_texture = Some(load_texture(ctx, "result", &artifacts.result));
                self.refs = Some(artifacts.refs);
                self.view.activate(ImageView::Result, ImageView::Original);
            }
            Err(e) => {
                // Refs, textures and view stay as they were.
                log::warn!("segmentation failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn shown_texture(&self) -> Option<&egui::TextureHandle> {
        match self.view.shown() {
            ImageView::Original => self.original_texture.as_ref(),
            ImageView::Result => self.result_texture.as_ref(),
        }
    }
}

fn load_texture(
    ctx: &egui::Context,
    name: &str,
    img: &image::RgbaImage,
) -> egui::TextureHandle {
    let size = [img.width() as usize, img.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

impl eframe::App for SegmentStudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_job(ctx);
        if self.controller.is_running() {
            // Keep polling while the worker is out.
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // Top panel: image selection and server info
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image").clicked() {
                    self.open_image(ctx);
                }
                if let Some(path) = &self.upload_path {
                    ui.label(path.file_name().unwrap_or_default().to_string_lossy().into_owned());
                } else {
                    ui.label("No image selected");
                }
                ui.separator();
                ui.label(format!("Server: {}", self.server_url));
            });
        });

        // Bottom panel: non-fatal failure notice
        if let Some(error) = self.last_error.clone() {
            egui::TopBottomPanel::bottom("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                    if ui.small_button("Dismiss").clicked() {
                        self.last_error = None;
                    }
                });
            });
        }

        // Left panel: the settings form
        egui::SidePanel::left("settings")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui_algorithm_select(ui, &mut self.form);
                    ui_param_row(ui, &mut self.form.sigma);

                    // Exactly one of the two panels, decided by the selection.
                    match self.form.algorithm {
                        Algorithm::Gbs => ui_gbs_params(ui, &mut self.form),
                        Algorithm::Hmsf => ui_hmsf_params(ui, &mut self.form),
                    }

                    ui_options(ui, &mut self.form);

                    ui.separator();
                    let running = self.controller.is_running();
                    ui.horizontal(|ui| {
                        let label = if running { "Segmenting" } else { "Run" };
                        if ui.add_enabled(!running, egui::Button::new(label)).clicked() {
                            self.submit();
                        }
                        if running {
                            ui.spinner();
                            ui.label("Working...");
                        }
                    });
                });
            });

        // Central panel: view toggle and the shown image
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for &view in ImageView::ALL {
                    if ui
                        .selectable_label(self.view.is_shown(view), view.name())
                        .clicked()
                    {
                        self.view.activate(view, view.other());
                    }
                }
                if let Some(refs) = &self.refs {
                    ui.separator();
                    let path = match self.view.shown() {
                        ImageView::Original => refs.original_path(),
                        ImageView::Result => refs.result_path(),
                    };
                    ui.weak(path);
                }
            });
            ui.separator();

            if let Some(tex) = self.shown_texture() {
                egui::ScrollArea::both().show(ui, |ui| {
                    let available = ui.available_size();
                    let tex_size = tex.size_vec2();
                    let scale = f32::min(
                        available.x / tex_size.x,
                        available.y / tex_size.y,
                    )
                    .min(1.0);
                    ui.image(egui::load::SizedTexture::new(tex.id(), tex_size * scale));
                });
            } else {
                ui.centered_and_justified(|ui| {
                    let hint = match self.view.shown() {
                        ImageView::Original => "Open an image to begin",
                        ImageView::Result => "Run a segmentation to see the result",
                    };
                    ui.label(hint);
                });
            }
        });
    }
}

// --- UI Section Builders ---

fn ui_param_row(ui: &mut egui::Ui, binding: &mut ParamBinding) {
    let spec = *binding.spec();
    ui.label(spec.label);
    ui.horizontal(|ui| {
        let mut raw = binding.value();
        let slider = ui.add(
            egui::Slider::new(&mut raw, spec.min..=spec.max)
                .step_by(spec.step)
                .show_value(false),
        );
        if slider.changed() {
            binding.set_from_control(raw);
        }
        let field = ui.add(egui::TextEdit::singleline(binding.text_mut()).desired_width(64.0));
        if field.lost_focus() {
            binding.commit_text();
        }
    });
}

fn ui_algorithm_select(ui: &mut egui::Ui, form: &mut SegmentForm) {
    egui::ComboBox::from_label("Algorithm")
        .selected_text(form.algorithm.name())
        .show_ui(ui, |ui| {
            for &algorithm in Algorithm::ALL {
                ui.selectable_value(&mut form.algorithm, algorithm, algorithm.name());
            }
        });
    ui.separator();
}

fn ui_gbs_params(ui: &mut egui::Ui, form: &mut SegmentForm) {
    egui::CollapsingHeader::new("GBS")
        .default_open(true)
        .show(ui, |ui| {
            ui_param_row(ui, &mut form.k);
            ui_param_row(ui, &mut form.minsize);
        });
}

fn ui_hmsf_params(ui: &mut egui::Ui, form: &mut SegmentForm) {
    egui::CollapsingHeader::new("HMSF")
        .default_open(true)
        .show(ui, |ui| {
            ui_param_row(ui, &mut form.minweight);
            ui_param_row(ui, &mut form.initcredit);
        });
}

fn ui_options(ui: &mut egui::Ui, form: &mut SegmentForm) {
    egui::CollapsingHeader::new("Options")
        .default_open(false)
        .show(ui, |ui| {
            egui::ComboBox::from_label("Graph")
                .selected_text(form.graph.name())
                .show_ui(ui, |ui| {
                    for &graph in GraphKind::ALL {
                        ui.selectable_value(&mut form.graph, graph, graph.name());
                    }
                });
            egui::ComboBox::from_label("Weight function")
                .selected_text(form.weightfn.name())
                .show_ui(ui, |ui| {
                    for &weightfn in WeightFn::ALL {
                        ui.selectable_value(&mut form.weightfn, weightfn, weightfn.name());
                    }
                });
            ui.checkbox(&mut form.random_colors, "Random region colors");
        });
}
