pub mod db_utils;
pub mod office_cache;
