/*!
   Initialization of the test process.
*/

pub mod init;
