use crate::geometry::ScreenTransform;
use crate::labeling::LabelingCandidate;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub width: f64,
    pub height: f64,
    pub extent: [f64; 4],
    pub labels: Vec<LabelEntryDump>,
}

#[derive(Debug, Serialize)]
pub struct LabelEntryDump {
    pub text: String,
    pub center: [f64; 2],
    pub world_center: [f64; 2],
    pub polygon: Vec<[f64; 2]>,
    pub runs: Vec<RunDump>,
}

#[derive(Debug, Serialize)]
pub struct RunDump {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl LabelDump {
    pub fn from_labels(labels: &[LabelingCandidate], transform: &ScreenTransform) -> Self {
        let extent = transform.extent();
        let labels = labels
            .iter()
            .map(|label| {
                let world = transform.screen_to_world(label.center);
                LabelEntryDump {
                    text: label.original_text.clone(),
                    center: [label.center.x, label.center.y],
                    world_center: [world.x, world.y],
                    polygon: label
                        .collision_polygon
                        .iter()
                        .map(|v| [v.x, v.y])
                        .collect(),
                    runs: label
                        .label_informations
                        .iter()
                        .map(|info| RunDump {
                            text: info.text.clone(),
                            x: info.position.x,
                            y: info.position.y,
                            rotation: info.rotation,
                        })
                        .collect(),
                }
            })
            .collect();
        LabelDump {
            width: transform.width(),
            height: transform.height(),
            extent: [extent.min_x, extent.min_y, extent.max_x, extent.max_y],
            labels,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_label_dump(
    path: &Path,
    labels: &[LabelingCandidate],
    transform: &ScreenTransform,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LabelDump::from_labels(labels, transform);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
