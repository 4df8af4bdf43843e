/*!
   Definitions of data types used by the configurer.
*/

pub mod channel;
pub mod config;
pub mod env;
pub mod topology;
