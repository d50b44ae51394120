mod common;

mod cache_manager_libraries;
