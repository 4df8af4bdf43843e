/*!
   Utility functions used by the configurer.
*/

pub mod random;
pub mod retry;
