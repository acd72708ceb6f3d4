//! Planar element merging.
//!
//! A planar file stores channels as separate elements (R, G, B as three
//! planes, or Y and chroma apart). The merger classifies each plane into a
//! channel slot of the composite image, derives the composite descriptor,
//! and interleaves the decoded planes into one buffer for the colorimetric
//! converter.

use logimage_core::{CodecError, Descriptor, LogElement, Result};
use tracing::debug;

/// Maximum number of elements a file can declare.
const MAX_ELEMENTS: usize = 8;

/// Classifies planes into channel slots and derives the composite
/// descriptor.
///
/// `elements` are the decodable planes in declaration order. Returns the
/// slot table (`slots[channel] = plane index`) and the composite
/// descriptor.
fn classify(elements: &[LogElement], depth: u32) -> Result<([Option<usize>; MAX_ELEMENTS], Descriptor)> {
    let has_alpha = elements
        .iter()
        .any(|e| e.descriptor == Descriptor::Alpha);

    let mut slots: [Option<usize>; MAX_ELEMENTS] = [None; MAX_ELEMENTS];
    let mut composite: Option<Descriptor> = None;

    let rgb_composite = if has_alpha {
        Descriptor::Rgba
    } else {
        Descriptor::Rgb
    };

    for (i, element) in elements.iter().enumerate() {
        match element.descriptor {
            Descriptor::Red | Descriptor::Rgb => {
                composite = Some(rgb_composite);
                slots[0] = Some(i);
            }
            Descriptor::Green => {
                composite = Some(rgb_composite);
                slots[1] = Some(i);
            }
            Descriptor::Blue => {
                composite = Some(rgb_composite);
                slots[2] = Some(i);
            }
            Descriptor::Alpha => {
                // Alpha is always the last channel of the composite.
                slots[depth as usize - 1] = Some(i);
            }
            Descriptor::Luminance => {
                match composite {
                    None => {
                        composite = Some(if has_alpha {
                            Descriptor::Ya
                        } else {
                            Descriptor::Luminance
                        });
                    }
                    Some(Descriptor::Chrominance) => {
                        composite = Some(ycbcr_composite(depth, has_alpha)?);
                    }
                    _ => {}
                }
                // Y sits in slot 1 unless it is alone or alone with alpha.
                if depth == 1 || (depth == 2 && has_alpha) {
                    slots[0] = Some(i);
                } else {
                    slots[1] = Some(i);
                }
            }
            Descriptor::Chrominance => {
                match composite {
                    None => composite = Some(Descriptor::Chrominance),
                    Some(Descriptor::Luminance) | Some(Descriptor::Ya) => {
                        composite = Some(ycbcr_composite(depth, has_alpha)?);
                    }
                    _ => {}
                }
                // Cb takes the first free of slots 0 and 2, Cr the other.
                if slots[0].is_none() {
                    slots[0] = Some(i);
                } else {
                    slots[2] = Some(i);
                }
            }
            Descriptor::CbYCr => {
                composite = Some(if has_alpha {
                    Descriptor::CbYCrA
                } else {
                    Descriptor::CbYCr
                });
                slots[0] = Some(i);
            }
            Descriptor::Rgba
            | Descriptor::Abgr
            | Descriptor::CbYACrYA
            | Descriptor::CbYCrY
            | Descriptor::CbYCrA => {
                // Pre-merged layouts; not expected in planar files but
                // honored when declared.
                composite = Some(element.descriptor);
                slots[0] = Some(i);
            }
            Descriptor::Ya | Descriptor::Depth | Descriptor::Composite => {
                // Ya never comes off the wire; Depth/Composite are skipped
                // before merging.
            }
        }
    }

    let composite = composite.ok_or(CodecError::UnsupportedDescriptor(
        "no mergeable elements in planar image",
    ))?;
    Ok((slots, composite))
}

/// Composite descriptor for a luminance/chrominance plane combination at
/// the given merged depth.
fn ycbcr_composite(depth: u32, has_alpha: bool) -> Result<Descriptor> {
    match (depth, has_alpha) {
        (2, _) => Ok(Descriptor::CbYCrY),
        (3, false) => Ok(Descriptor::CbYCr),
        (3, true) => Ok(Descriptor::CbYACrYA),
        (4, _) => Ok(Descriptor::CbYCrA),
        _ => Err(CodecError::UnsupportedDescriptor(
            "luminance/chrominance planes with unsupported channel count",
        )),
    }
}

/// Merges decoded planes into one interleaved composite buffer.
///
/// `planes[i]` is the decoded float data of `elements[i]`. The composite
/// element copies element 0's storage parameters with the derived
/// descriptor and the summed depth.
pub(crate) fn merge_planes(
    width: u32,
    height: u32,
    elements: &[LogElement],
    planes: &[Vec<f32>],
) -> Result<(Vec<f32>, LogElement)> {
    debug_assert_eq!(elements.len(), planes.len());

    let depth: u32 = elements.iter().map(|e| e.depth).sum();
    if depth == 0 || depth as usize > MAX_ELEMENTS {
        return Err(CodecError::UnsupportedDescriptor(
            "planar image merges to an unusable channel count",
        ));
    }

    let (slots, descriptor) = classify(elements, depth)?;
    debug!(?descriptor, depth, "merging {} planar elements", elements.len());

    // Every channel of the composite must be fed by exactly one plane.
    let slotted_depth: u32 = slots
        .iter()
        .flatten()
        .map(|&i| elements[i].depth)
        .sum();
    if slotted_depth != depth {
        return Err(CodecError::invalid_header(
            "planar elements do not assemble into a complete pixel",
        ));
    }

    let pixel_count = width as usize * height as usize;
    let mut merged = vec![0.0f32; pixel_count * depth as usize];
    let mut cursors = vec![0usize; planes.len()];

    // Walk output slots in channel order, consuming each plane's samples
    // round-robin. Slot order, not declaration order, fixes the channel
    // position even when planes arrive out of sequence.
    let mut sample = 0;
    while sample < merged.len() {
        for slot in slots.iter().take(depth as usize) {
            let Some(plane_index) = *slot else { continue };
            let take = elements[plane_index].depth as usize;
            let cursor = cursors[plane_index];
            let src = planes[plane_index]
                .get(cursor..cursor + take)
                .ok_or(CodecError::Truncated)?;
            merged[sample..sample + take].copy_from_slice(src);
            cursors[plane_index] += take;
            sample += take;
        }
    }

    let mut composite = elements[0].clone();
    composite.descriptor = descriptor;
    composite.depth = depth;
    Ok((merged, composite))
}
