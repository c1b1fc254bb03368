//! Built-in material heuristics

use super::{BomLine, BomRule, BomSkip, RuleContext};

const PCS: &str = "pcs";
const METRES: &str = "m";
const SQUARE_METRES: &str = "m²";

/// `ceil(length / spacing) + 1` posts for a run.
///
/// `None` when the triggers are absent or the run is empty.
pub fn post_count(ctx: &RuleContext<'_>) -> Option<Result<f64, BomSkip>> {
    let length = ctx.lookup(&ctx.vocab.length)?;
    let spacing = ctx.lookup(&ctx.vocab.post_spacing)?;

    if length <= 0.0 {
        return None;
    }
    if spacing <= 0.0 {
        return Some(Err(BomSkip::new(
            PostRule.name(),
            format!("post spacing must be positive, got {}", spacing),
        )));
    }
    Some(Ok((length / spacing).ceil() + 1.0))
}

/// Posts along the run
pub struct PostRule;

impl BomRule for PostRule {
    fn name(&self) -> &'static str {
        "posts"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        match post_count(ctx) {
            Some(posts) => Ok(vec![BomLine::new("Posts", posts?, PCS)]),
            None => Ok(vec![]),
        }
    }
}

/// Concrete bags when posts are set in concrete, brackets otherwise
pub struct MountingRule;

impl BomRule for MountingRule {
    fn name(&self) -> &'static str {
        "mounting"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        // A failed post count is already reported by PostRule
        let Some(Ok(posts)) = post_count(ctx) else {
            return Ok(vec![]);
        };

        let in_concrete = ctx
            .lookup(&ctx.vocab.concrete_mount)
            .is_some_and(|flag| flag != 0.0);

        if !in_concrete {
            return Ok(vec![BomLine::new("Surface-mount brackets", posts, PCS)]);
        }

        let per_post = ctx
            .lookup(&ctx.vocab.bags_per_post)
            .unwrap_or(ctx.vocab.default_bags_per_post);
        if per_post < 0.0 {
            return Err(BomSkip::new(
                self.name(),
                format!("bags per post must not be negative, got {}", per_post),
            ));
        }
        Ok(vec![BomLine::new("Concrete bags", posts * per_post, PCS)])
    }
}

/// Corner connectors
pub struct CornerRule;

impl BomRule for CornerRule {
    fn name(&self) -> &'static str {
        "corners"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        match ctx.lookup(&ctx.vocab.corners) {
            Some(corners) if corners > 0.0 => {
                Ok(vec![BomLine::new("Corner connectors", corners, PCS)])
            }
            _ => Ok(vec![]),
        }
    }
}

/// Running metres of horizontal rail: rows × length
pub struct RailRule;

impl BomRule for RailRule {
    fn name(&self) -> &'static str {
        "rails"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        let (Some(rows), Some(length)) = (
            ctx.lookup(&ctx.vocab.rail_rows),
            ctx.lookup(&ctx.vocab.length),
        ) else {
            return Ok(vec![]);
        };
        if rows <= 0.0 || length <= 0.0 {
            return Ok(vec![]);
        }
        if rows.fract() != 0.0 {
            return Err(BomSkip::new(
                self.name(),
                format!("rail rows must be a whole number, got {}", rows),
            ));
        }
        Ok(vec![BomLine::new(
            format!("Horizontal rails ({} rows)", rows),
            rows * length,
            METRES,
        )])
    }
}

/// Glass area: panel height × length
pub struct GlassRule;

impl BomRule for GlassRule {
    fn name(&self) -> &'static str {
        "glass"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        let (Some(height), Some(length)) = (
            ctx.lookup(&ctx.vocab.glass_height),
            ctx.lookup(&ctx.vocab.length),
        ) else {
            return Ok(vec![]);
        };
        if height <= 0.0 || length <= 0.0 {
            return Ok(vec![]);
        }
        Ok(vec![BomLine::new("Glass panels", height * length, SQUARE_METRES)])
    }
}

/// Roof / cover area: width × depth
pub struct RoofRule;

impl BomRule for RoofRule {
    fn name(&self) -> &'static str {
        "roof"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        let (Some(width), Some(depth)) = (
            ctx.lookup(&ctx.vocab.roof_width),
            ctx.lookup(&ctx.vocab.roof_depth),
        ) else {
            return Ok(vec![]);
        };
        if width <= 0.0 || depth <= 0.0 {
            return Ok(vec![]);
        }
        Ok(vec![BomLine::new("Roof area", width * depth, SQUARE_METRES)])
    }
}

/// Stair steps from the floor height: ceil(height / riser)
pub struct StepRule;

impl BomRule for StepRule {
    fn name(&self) -> &'static str {
        "steps"
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Result<Vec<BomLine>, BomSkip> {
        let Some(height) = ctx.lookup(&ctx.vocab.floor_height) else {
            return Ok(vec![]);
        };
        if height <= 0.0 {
            return Ok(vec![]);
        }
        let riser = ctx
            .lookup(&ctx.vocab.riser_height)
            .unwrap_or(ctx.vocab.default_riser_height);
        if riser <= 0.0 {
            return Err(BomSkip::new(
                self.name(),
                format!("riser height must be positive, got {}", riser),
            ));
        }
        Ok(vec![BomLine::new("Steps", (height / riser).ceil(), PCS)])
    }
}
