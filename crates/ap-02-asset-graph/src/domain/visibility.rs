//! # Visibility & Access Controller
//!
//! `can_discover(p, n) = n is Public OR (n is Private AND p == n.private_target)`
//!
//! Pure predicates. Changing a listing never touches buy requests that are
//! already pending.

use shared_types::{Address, Listing, OriginLot, Pack, RetailUnit, Visibility};

/// A node whose discoverability is governed by a visibility setting.
pub trait Discoverable {
    fn visibility(&self) -> Visibility;

    /// The single participant allowed to discover a private node.
    fn private_target(&self) -> Option<Address>;
}

/// True if `participant` may discover and target `node`.
pub fn can_discover<N: Discoverable + ?Sized>(participant: &Address, node: &N) -> bool {
    match node.visibility() {
        Visibility::Public => true,
        Visibility::Private => node.private_target().as_ref() == Some(participant),
    }
}

impl Discoverable for Listing {
    fn visibility(&self) -> Visibility {
        Listing::visibility(self)
    }

    fn private_target(&self) -> Option<Address> {
        Listing::private_target(self)
    }
}

impl Discoverable for OriginLot {
    fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn private_target(&self) -> Option<Address> {
        None
    }
}

impl Discoverable for Pack {
    fn visibility(&self) -> Visibility {
        self.listing.visibility()
    }

    fn private_target(&self) -> Option<Address> {
        self.listing.private_target()
    }
}

impl Discoverable for RetailUnit {
    fn visibility(&self) -> Visibility {
        self.listing.visibility()
    }

    fn private_target(&self) -> Option<Address> {
        self.listing.private_target()
    }
}
