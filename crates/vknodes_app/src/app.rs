// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main editor application.

use crate::config::EditorConfig;
use vknodes_graph::{Graph, GraphEditorState, NodeRegistry};

/// Error that ends the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Window or renderer failure
    #[error("UI error: {0}")]
    Ui(#[from] eframe::Error),
}

/// Editor application: one graph and its canvas
pub struct EditorApp {
    graph: Graph,
    registry: NodeRegistry,
    editor: GraphEditorState,
}

impl EditorApp {
    /// Create the application from its config
    pub fn new(config: &EditorConfig) -> Self {
        let mut editor = GraphEditorState::new().with_layout_path(config.layout_file.clone());
        editor.show_grid = config.editor.show_grid;
        editor.show_minimap = config.editor.show_minimap;
        editor.snap_to_grid = config.editor.snap_to_grid;
        editor.snap_size = config.editor.snap_size;

        let graph = Graph::demo();
        tracing::info!(
            nodes = graph.node_count(),
            links = graph.link_count(),
            "Demo graph created"
        );

        Self {
            graph,
            registry: NodeRegistry::builtin(),
            editor,
        }
    }

    /// Open the window and run until it is closed
    pub fn run(config: EditorConfig) -> Result<(), AppError> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(config.window.title.clone())
                .with_inner_size([config.window.width, config.window.height]),
            ..Default::default()
        };

        let title = config.window.title.clone();
        eframe::run_native(
            &title,
            options,
            Box::new(move |_cc| Ok(Box::new(EditorApp::new(&config)))),
        )?;

        tracing::info!("Editor closed");
        Ok(())
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(28, 28, 30)))
            .show(ctx, |ui| {
                self.editor.ui(ui, &mut self.graph, &self.registry);
            });
    }
}
