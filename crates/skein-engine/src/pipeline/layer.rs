/// Ordered rendering passes.
///
/// Back layers draw first. The per-category convention is one back layer for
/// unselected entities and one front layer for selected entities, so selected
/// content stacks on top regardless of category order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderingLayer {
    Back1,
    Back2,
    Back3,
    Back4,
    Front1,
    Front2,
    Front3,
    Front4,
}

/// All layers in draw order. The frame scheduler iterates exactly this.
pub const ALL_LAYERS: [RenderingLayer; 8] = [
    RenderingLayer::Back1,
    RenderingLayer::Back2,
    RenderingLayer::Back3,
    RenderingLayer::Back4,
    RenderingLayer::Front1,
    RenderingLayer::Front2,
    RenderingLayer::Front3,
    RenderingLayer::Front4,
];

impl RenderingLayer {
    /// Back layers carry unselected entities (dimmed when a selection exists).
    #[inline]
    pub fn is_back(self) -> bool {
        matches!(
            self,
            RenderingLayer::Back1
                | RenderingLayer::Back2
                | RenderingLayer::Back3
                | RenderingLayer::Back4
        )
    }

    #[inline]
    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Small set of rendering layers a renderer participates in.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LayerSet(u16);

impl LayerSet {
    pub const EMPTY: LayerSet = LayerSet(0);

    pub fn of(layers: &[RenderingLayer]) -> Self {
        let mut bits = 0;
        for layer in layers {
            bits |= layer.bit();
        }
        LayerSet(bits)
    }

    #[inline]
    pub fn contains(self, layer: RenderingLayer) -> bool {
        self.0 & layer.bit() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_layers_back_before_front() {
        let first_front = ALL_LAYERS.iter().position(|l| !l.is_back()).unwrap();
        assert!(ALL_LAYERS[..first_front].iter().all(|l| l.is_back()));
        assert!(ALL_LAYERS[first_front..].iter().all(|l| !l.is_back()));
    }

    #[test]
    fn layer_set_membership() {
        let set = LayerSet::of(&[RenderingLayer::Back1, RenderingLayer::Front1]);
        assert!(set.contains(RenderingLayer::Back1));
        assert!(set.contains(RenderingLayer::Front1));
        assert!(!set.contains(RenderingLayer::Back2));
        assert!(!LayerSet::EMPTY.contains(RenderingLayer::Back1));
    }
}
