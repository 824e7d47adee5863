use super::classify::PointClassification;
use super::split::SolidSource;

/// The boolean operations the kernel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    /// A minus B.
    Subtract,
}

/// What happens to a boundary fragment in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepDecision {
    Keep,
    /// Kept with reversed winding: a piece of B bounding a cut cavity.
    KeepFlipped,
    Discard,
}

/// Decides the fate of a fragment from its position relative to the other
/// solid.
///
/// | Fragment | vs other solid | Union   | Subtract (A-B) |
/// |----------|----------------|---------|----------------|
/// | from A   | outside B      | keep    | keep           |
/// | from A   | inside B       | discard | discard        |
/// | from B   | outside A      | keep    | discard        |
/// | from B   | inside A       | discard | keep, flipped  |
///
/// Boundary fragments are kept from A and dropped from B, so a shared face
/// appears once.
#[must_use]
pub fn should_keep_fragment(
    source: SolidSource,
    classification: PointClassification,
    op: BooleanOp,
) -> KeepDecision {
    use PointClassification::{Inside, OnBoundary, Outside};

    match (op, source, classification) {
        (_, SolidSource::A, OnBoundary | Outside) => KeepDecision::Keep,
        (_, SolidSource::B, OnBoundary) | (_, SolidSource::A, Inside) => KeepDecision::Discard,
        (BooleanOp::Union, SolidSource::B, Outside) => KeepDecision::Keep,
        (BooleanOp::Union, SolidSource::B, Inside) => KeepDecision::Discard,
        (BooleanOp::Subtract, SolidSource::B, Outside) => KeepDecision::Discard,
        (BooleanOp::Subtract, SolidSource::B, Inside) => KeepDecision::KeepFlipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_keeps_outside_fragments() {
        for source in [SolidSource::A, SolidSource::B] {
            assert_eq!(
                should_keep_fragment(source, PointClassification::Outside, BooleanOp::Union),
                KeepDecision::Keep
            );
            assert_eq!(
                should_keep_fragment(source, PointClassification::Inside, BooleanOp::Union),
                KeepDecision::Discard
            );
        }
    }

    #[test]
    fn subtract_table() {
        let op = BooleanOp::Subtract;
        assert_eq!(
            should_keep_fragment(SolidSource::A, PointClassification::Outside, op),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_fragment(SolidSource::A, PointClassification::Inside, op),
            KeepDecision::Discard
        );
        assert_eq!(
            should_keep_fragment(SolidSource::B, PointClassification::Outside, op),
            KeepDecision::Discard
        );
        assert_eq!(
            should_keep_fragment(SolidSource::B, PointClassification::Inside, op),
            KeepDecision::KeepFlipped
        );
    }

    #[test]
    fn boundary_kept_once() {
        assert_eq!(
            should_keep_fragment(SolidSource::A, PointClassification::OnBoundary, BooleanOp::Union),
            KeepDecision::Keep
        );
        assert_eq!(
            should_keep_fragment(SolidSource::B, PointClassification::OnBoundary, BooleanOp::Union),
            KeepDecision::Discard
        );
    }
}
