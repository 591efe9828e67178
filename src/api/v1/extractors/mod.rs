mod claims;

pub use claims::MaybeClaims;
