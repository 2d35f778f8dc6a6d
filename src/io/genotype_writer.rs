use crate::utils::util::Result;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

/// Buffered destination for the genotyper's CSV stream; standard output when
/// no path is given.
pub struct GenotypeWriter {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl GenotypeWriter {
    pub fn new(output: Option<&str>) -> Result<Self> {
        let sink: Box<dyn Write + Send> = match output {
            Some(path) => Box::new(File::create(path).map_err(|error| {
                crate::gvx_error!("Failed to create output file {path}: {error}")
            })?),
            None => Box::new(io::stdout()),
        };
        Ok(Self {
            writer: BufWriter::new(sink),
        })
    }

    pub fn write_block(&mut self, block: &[u8]) -> Result<()> {
        self.writer.write_all(block)?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, time::SystemTime};

    #[test]
    fn writes_blocks_to_the_given_path() {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("gvx_test_genotype_writer_{nanos}.csv"));
        let path_str = path.to_str().unwrap().to_string();

        let mut writer = GenotypeWriter::new(Some(&path_str)).unwrap();
        writer.write_block(b"100,T,G,20\n").unwrap();
        writer.write_block(b"200,A,C,30\n").unwrap();
        writer.finish().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(contents, "100,T,G,20\n200,A,C,30\n");
    }
}
