use std::path::Path;
use std::fs::{self, File};
use std::io::{Write, Read};
use serde::{Serialize, de::DeserializeOwned};
use crate::ircore::error::Result;


pub fn write_file<T: Serialize>(filepath: &Path, obj: &T) -> Result<()>{
    if let Some(dir) = filepath.parent() {
        fs::create_dir_all(dir)?;
    }
    let encoded: Vec<u8> = bincode::serialize(obj)?;
    let mut writer = File::create(filepath)?;
    writer.write_all(&encoded)?;
    Ok(())
}

pub fn read_file<T: DeserializeOwned>(filepath: &Path) -> Result<T> {
    let mut reader = File::open(filepath)?;
    let mut encoded: Vec<u8> = vec![];
    reader.read_to_end(&mut encoded)?;
    let reloaded_obj: T = bincode::deserialize(&encoded[..])?;
    Ok(reloaded_obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/obj.bin");
        let mut obj: HashMap<String, Vec<u32>> = HashMap::new();
        obj.insert("apple".to_string(), vec![1, 4, 9]);
        write_file(&path, &obj).unwrap();
        let reloaded: HashMap<String, Vec<u32>> = read_file(&path).unwrap();
        assert_eq!(reloaded, obj);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let res: Result<Vec<u32>> = read_file(&dir.path().join("missing.bin"));
        assert!(res.is_err());
    }
}
