// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composable transformations applied while a fault layer is built.

use crate::Layer;

/// A transformation that attaches something to the layer being built.
///
/// Wrappers are plain values: [`Tag`](crate::Tag), [`Message`](crate::Message),
/// [`Meta`](crate::Meta), [`Stack`](crate::Stack), or a closure adapted with [`from_fn`].
/// `Option<W>` is a wrapper that does nothing when `None`.
pub trait Wrapper {
    /// Returns `layer` with this wrapper's contribution attached.
    fn apply(self, layer: Layer) -> Layer;
}

/// A list of wrappers applied left to right.
///
/// Implemented for `()`, any single [`Wrapper`], tuples of up to eight wrappers, and `Vec<W>`.
pub trait Wrappers {
    /// Applies every wrapper in order.
    fn apply_all(self, layer: Layer) -> Layer;
}

impl<W: Wrapper> Wrapper for Option<W> {
    fn apply(self, layer: Layer) -> Layer {
        match self {
            Some(wrapper) => wrapper.apply(layer),
            None => layer,
        }
    }
}

/// Adapts a closure into a [`Wrapper`].
///
/// ```rust
/// use faultline::{Fault, Tag, wrapper};
///
/// let retryable = true;
/// let error = Fault::new(
///     "connection reset",
///     wrapper::from_fn(move |layer| if retryable { layer.with_tag(Tag::Internal) } else { layer }),
/// );
/// assert_eq!(error.tag(), Tag::Internal);
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnOnce(Layer) -> Layer,
{
    FromFn(f)
}

/// A [`Wrapper`] created with [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

impl<F> Wrapper for FromFn<F>
where
    F: FnOnce(Layer) -> Layer,
{
    fn apply(self, layer: Layer) -> Layer {
        (self.0)(layer)
    }
}

impl Wrappers for () {
    fn apply_all(self, layer: Layer) -> Layer {
        layer
    }
}

impl<W: Wrapper> Wrappers for W {
    fn apply_all(self, layer: Layer) -> Layer {
        self.apply(layer)
    }
}

impl<W: Wrapper> Wrappers for Vec<W> {
    fn apply_all(self, layer: Layer) -> Layer {
        self.into_iter().fold(layer, |layer, wrapper| wrapper.apply(layer))
    }
}

impl<W1, W2> Wrappers for (W1, W2)
where
    W1: Wrapper,
    W2: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2) = self;

        w2.apply(w1.apply(layer))
    }
}

impl<W1, W2, W3> Wrappers for (W1, W2, W3)
where
    W1: Wrapper,
    W2: Wrapper,
    W3: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2, w3) = self;

        (w2, w3).apply_all(w1.apply(layer))
    }
}

impl<W1, W2, W3, W4> Wrappers for (W1, W2, W3, W4)
where
    W1: Wrapper,
    W2: Wrapper,
    W3: Wrapper,
    W4: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2, w3, w4) = self;

        (w2, w3, w4).apply_all(w1.apply(layer))
    }
}

impl<W1, W2, W3, W4, W5> Wrappers for (W1, W2, W3, W4, W5)
where
    W1: Wrapper,
    W2: Wrapper,
    W3: Wrapper,
    W4: Wrapper,
    W5: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2, w3, w4, w5) = self;

        (w2, w3, w4, w5).apply_all(w1.apply(layer))
    }
}

impl<W1, W2, W3, W4, W5, W6> Wrappers for (W1, W2, W3, W4, W5, W6)
where
    W1: Wrapper,
    W2: Wrapper,
    W3: Wrapper,
    W4: Wrapper,
    W5: Wrapper,
    W6: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2, w3, w4, w5, w6) = self;

        (w2, w3, w4, w5, w6).apply_all(w1.apply(layer))
    }
}

impl<W1, W2, W3, W4, W5, W6, W7> Wrappers for (W1, W2, W3, W4, W5, W6, W7)
where
    W1: Wrapper,
    W2: Wrapper,
    W3: Wrapper,
    W4: Wrapper,
    W5: Wrapper,
    W6: Wrapper,
    W7: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2, w3, w4, w5, w6, w7) = self;

        (w2, w3, w4, w5, w6, w7).apply_all(w1.apply(layer))
    }
}

impl<W1, W2, W3, W4, W5, W6, W7, W8> Wrappers for (W1, W2, W3, W4, W5, W6, W7, W8)
where
    W1: Wrapper,
    W2: Wrapper,
    W3: Wrapper,
    W4: Wrapper,
    W5: Wrapper,
    W6: Wrapper,
    W7: Wrapper,
    W8: Wrapper,
{
    fn apply_all(self, layer: Layer) -> Layer {
        let (w1, w2, w3, w4, w5, w6, w7, w8) = self;

        (w2, w3, w4, w5, w6, w7, w8).apply_all(w1.apply(layer))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, Tag};

    #[test]
    fn applied_left_to_right() {
        let layer = (Tag::NotFound, Message::new("first"), Tag::InvalidArgument).apply_all(Layer::new());

        assert_eq!(layer.tag(), Some(Tag::InvalidArgument));
        assert_eq!(layer.label(), Some("first"));
    }

    #[test]
    fn unit_is_identity() {
        let layer = ().apply_all(Layer::new());
        assert!(layer.tag().is_none());
        assert!(layer.label().is_none());
    }

    #[test]
    fn option_and_vec() {
        let layer = vec![Some(Tag::NotFound), None].apply_all(Layer::new());
        assert_eq!(layer.tag(), Some(Tag::NotFound));

        let layer = None::<Tag>.apply_all(Layer::new());
        assert!(layer.tag().is_none());
    }

    #[test]
    fn closures() {
        let layer = from_fn(|layer: Layer| layer.with_issue("try again")).apply_all(Layer::new());
        assert_eq!(layer.issue(), Some("try again"));
    }

    #[test]
    fn eight_wrappers() {
        let layer = (
            Tag::NotFound,
            Tag::NotFound,
            Tag::NotFound,
            Tag::NotFound,
            Tag::NotFound,
            Tag::NotFound,
            Tag::NotFound,
            Message::with_issue("last", "shown"),
        )
            .apply_all(Layer::new());

        assert_eq!(layer.issue(), Some("shown"));
    }
}
