pub mod emsa;
