pub mod certification;
pub mod evidence;
pub mod identity;
pub mod risk;
pub mod trust;
pub mod verification;
