//! The configuration store.
//!
//! [`ConfigurationStore`] owns the canonical [`Configuration`] for the lifetime of
//! a page view. Local edits go through its mutation methods, which commit the new
//! state, republish the canonical fragment and notify observers. External
//! navigation comes back in through [`ConfigurationStore::reconcile`], which only
//! commits when the fragment means something different from the current state.
//! Because the store's own writes decode to the state that produced them, the
//! notification they raise never causes a second commit.


use crate::codec;
use crate::features::FeatureSet;
use crate::fragment::{Delivery, FragmentIo, ListenerId};
use crate::seed::SeedSource;
use crate::shape;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Identifies an observer registered with [`ConfigurationStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

/// Callback run after every committed change.
///
/// Observers run synchronously inside the mutation that triggered them and must
/// not call back into the store.
pub type Observer = Box<dyn FnMut(&Configuration)>;

/// Owns the current configuration and keeps the fragment in step with it.
pub struct ConfigurationStore<F: FragmentIo, S: SeedSource> {
    /// The canonical state
    configuration: Configuration,
    /// Canonical encoding of `configuration`, as last published
    last_written: String,
    /// Navigation fragment access
    io: F,
    /// Source of fresh seeds
    seeds: S,
    /// Fallback values for fields a fragment does not carry
    defaults: Defaults,
    /// Observers in subscription order
    observers: Vec<(SubscriptionId, Observer)>,
}

impl<F: FragmentIo, S: SeedSource> ConfigurationStore<F, S> {
    /// Creates a store from the fragment currently held by `io`.
    ///
    /// Fields the fragment lacks come from `defaults` (and a fresh seed from
    /// `seeds`). If the fragment is not already canonical it is rewritten.
    ///
    /// # Arguments
    ///
    /// * `io` - Access to the navigation fragment
    /// * `seeds` - Source of fresh seeds
    /// * `defaults` - Values for fields the fragment does not provide
    pub fn new(io: F, mut seeds: S, defaults: Defaults) -> Self {
        let configuration = codec::decode(&io.read(), &defaults, &mut seeds);
        let mut store = Self {
            last_written: String::new(),
            configuration,
            io,
            seeds,
            defaults,
            observers: Vec::new(),
        };
        store.publish();
        log::debug!("store initialised at {}", store.last_written);
        store
    }

    /// The current configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Primary size of the current shape.
    pub fn size(&self) -> u32 {
        self.configuration.shape.size()
    }

    /// Canonical fragment for the current configuration.
    pub fn fragment(&self) -> &str {
        &self.last_written
    }

    /// The defaults this store falls back to.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// The fragment access this store writes through.
    pub fn io(&self) -> &F {
        &self.io
    }

    /// Registers an observer, called after every committed change.
    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(Uuid::new_v4());
        self.observers.push((id, observer));
        id
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Switches to another shape kind, converting the size to keep a similar scale.
    pub fn set_shape_kind(&mut self, kind: ShapeKind) -> &Configuration {
        let shape = shape::convert(self.configuration.shape, kind);
        self.apply(Configuration {
            shape,
            ..self.configuration.clone()
        })
    }

    /// Sets the primary size, clamped into the current kind's domain.
    pub fn set_size(&mut self, size: i64) -> &Configuration {
        self.adjust_size(|_| size)
    }

    /// Grows the shape by one step.
    pub fn increment(&mut self) -> &Configuration {
        self.adjust_size(|old| old.saturating_add(1))
    }

    /// Shrinks the shape by one step.
    pub fn decrement(&mut self) -> &Configuration {
        self.adjust_size(|old| old.saturating_sub(1))
    }

    /// Draws a fresh seed.
    pub fn new_seed(&mut self) -> &Configuration {
        let seed = self.seeds.fresh_seed();
        self.apply(Configuration {
            seed,
            ..self.configuration.clone()
        })
    }

    /// Selects the generation algorithm.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) -> &Configuration {
        self.apply(Configuration {
            algorithm,
            ..self.configuration.clone()
        })
    }

    /// Enables `feature` if disabled, disables it otherwise.
    pub fn toggle_feature(&mut self, feature: Feature) -> &Configuration {
        self.update_features(|features| features.toggle(feature))
    }

    /// Enables `feature`.
    pub fn add_feature(&mut self, feature: Feature) -> &Configuration {
        self.update_features(|features| features.add(feature))
    }

    /// Disables `feature`.
    pub fn remove_feature(&mut self, feature: Feature) -> &Configuration {
        self.update_features(|features| features.remove(feature))
    }

    /// Sets the wall colour.
    pub fn set_colour(&mut self, colour: WebColour) -> &Configuration {
        self.apply(Configuration {
            colour,
            ..self.configuration.clone()
        })
    }

    /// Sets the stroke width. Non-positive or non-finite widths are ignored.
    pub fn set_stroke_width(&mut self, stroke_width: f64) -> &Configuration {
        if !is_valid_stroke_width(stroke_width) {
            log::debug!("ignoring invalid stroke width {stroke_width}");
            return &self.configuration;
        }
        self.apply(Configuration {
            stroke_width,
            ..self.configuration.clone()
        })
    }

    /// Merges an externally observed fragment into the current state.
    ///
    /// The fragment's shape, algorithm and seed replace the current ones only if
    /// at least one of them differs; colour, features and stroke width are kept.
    ///
    /// # Returns
    ///
    /// True if the state changed.
    pub fn reconcile(&mut self, fragment: &str) -> bool {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment == self.last_written {
            log::trace!("ignoring echo of our own fragment {fragment:?}");
            return false;
        }

        let decoded = codec::decode(fragment, &self.defaults, &mut self.seeds);
        if codec::semantically_equal(&decoded, &self.configuration) {
            log::trace!("fragment {fragment:?} matches the current state");
            return false;
        }

        log::debug!("reconciling navigation to {fragment:?}");
        self.apply(Configuration {
            shape: decoded.shape,
            algorithm: decoded.algorithm,
            seed: decoded.seed,
            ..self.configuration.clone()
        });
        true
    }

    /// Reconciles against whatever the fragment currently holds.
    pub fn sync_from_fragment(&mut self) -> bool {
        let fragment = self.io.read();
        self.reconcile(&fragment)
    }

    fn adjust_size(&mut self, f: impl FnOnce(i64) -> i64) -> &Configuration {
        let shape = shape::adjust_size(self.configuration.shape, f);
        self.apply(Configuration {
            shape,
            ..self.configuration.clone()
        })
    }

    fn update_features(&mut self, f: impl FnOnce(FeatureSet) -> FeatureSet) -> &Configuration {
        let features = f(self.configuration.features.clone());
        self.apply(Configuration {
            features,
            ..self.configuration.clone()
        })
    }

    /// Commits `next`, republishes the fragment and notifies observers.
    fn apply(&mut self, next: Configuration) -> &Configuration {
        if next == self.configuration {
            log::trace!("mutation left the configuration unchanged");
            return &self.configuration;
        }
        self.configuration = next;
        self.publish();
        log::debug!("committed {}", self.last_written);
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.configuration);
        }
        &self.configuration
    }

    /// Writes the canonical encoding unless the fragment already holds it.
    fn publish(&mut self) {
        self.last_written = codec::encode(&self.configuration);
        if self.io.read() != self.last_written {
            self.io.write(&self.last_written);
        }
    }
}

impl<F: FragmentIo + 'static, S: SeedSource + 'static> ConfigurationStore<F, S> {
    /// Routes the fragment's change notifications into [`ConfigurationStore::reconcile`].
    ///
    /// The listener holds only a weak reference, so it stops acting once the
    /// store is dropped. A notification that arrives while the store is
    /// borrowed is deferred and delivered again by the fragment.
    ///
    /// # Returns
    ///
    /// The listener id, for [`ConfigurationStore::disconnect`].
    pub fn connect(store: &Rc<RefCell<Self>>) -> ListenerId {
        let weak = Rc::downgrade(store);
        store.borrow_mut().io.on_change(Box::new(move |fragment| {
            let Some(store) = weak.upgrade() else {
                return Delivery::Handled;
            };
            let delivery = match store.try_borrow_mut() {
                Ok(mut store) => {
                    store.reconcile(fragment);
                    Delivery::Handled
                }
                Err(_) => {
                    log::debug!("store busy; deferring navigation to {fragment:?}");
                    Delivery::Retry
                }
            };
            delivery
        }))
    }

    /// Removes a listener installed by [`ConfigurationStore::connect`].
    pub fn disconnect(store: &Rc<RefCell<Self>>, id: ListenerId) -> bool {
        store.borrow_mut().io.remove_listener(id)
    }
}
