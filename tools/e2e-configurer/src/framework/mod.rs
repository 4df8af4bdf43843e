/*!
   The scenario configurers and the setup plans they run.
*/

pub mod configurer;
pub mod scenario;
pub mod setup;
