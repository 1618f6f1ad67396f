use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use freqview::data::filter::{to_log_x, Trace};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Sweep plot (central panel)
// ---------------------------------------------------------------------------

/// Render the mean sweep of every selected trace, with optional error bars.
pub fn sweep_plot(ui: &mut Ui, state: &AppState) {
    if state.current_stats().is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No group matches the selected filters  (File → Open folder…)");
        });
        return;
    }

    let traces = state.traces();
    let log_x = state.log_x();
    let y_label = state.y_column().unwrap_or_default().to_string();

    ui.heading(state.title());
    values_table(ui, &traces, &y_label);

    Plot::new("sweep_plot")
        .legend(Legend::default())
        .x_axis_label("Frequency (Hz)")
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark, _range| {
            if log_x {
                format!("{:.3e}", 10f64.powf(mark.value))
            } else {
                format!("{}", mark.value)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for trace in &traces {
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(&trace.label))
                    .unwrap_or(Color32::LIGHT_BLUE);

                let points = if log_x {
                    to_log_x(&trace.points)
                } else {
                    trace.points.clone()
                };

                let xy: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
                plot_ui.line(
                    Line::new(PlotPoints::from(xy.clone()))
                        .name(&trace.label)
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(xy))
                        .name(&trace.label)
                        .color(color)
                        .radius(4.0),
                );

                if !state.show_error_bars {
                    continue;
                }
                // Points whose std is missing get no bar.
                for p in &points {
                    let Some(err) = p.err.filter(|e| e.is_finite()) else {
                        continue;
                    };
                    let bar: PlotPoints = vec![[p.x, p.y - err], [p.x, p.y + err]].into();
                    plot_ui.line(Line::new(bar).name(&trace.label).color(color).width(1.0));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Values table
// ---------------------------------------------------------------------------

/// Collapsible mean ± std listing of the plotted traces.
fn values_table(ui: &mut Ui, traces: &[Trace], y_label: &str) {
    egui::CollapsingHeader::new(RichText::new("Values").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(200.0)
                .column(Column::auto().at_least(120.0))
                .column(Column::auto().at_least(100.0))
                .column(Column::auto().at_least(100.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Trace");
                    });
                    header.col(|ui| {
                        ui.strong("Frequency (Hz)");
                    });
                    header.col(|ui| {
                        ui.strong(format!("{y_label} mean"));
                    });
                    header.col(|ui| {
                        ui.strong("std");
                    });
                })
                .body(|mut body| {
                    for trace in traces {
                        for p in &trace.points {
                            body.row(18.0, |mut row| {
                                row.col(|ui| {
                                    ui.label(trace.label.as_str());
                                });
                                row.col(|ui| {
                                    ui.label(format!("{}", p.x));
                                });
                                row.col(|ui| {
                                    ui.label(format!("{:.6}", p.y));
                                });
                                row.col(|ui| {
                                    let text = p
                                        .err
                                        .map(|e| format!("{e:.6}"))
                                        .unwrap_or_else(|| "–".to_string());
                                    ui.label(text);
                                });
                            });
                        }
                    }
                });
        });
}
