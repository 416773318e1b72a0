/*!
 * XML manifest writer for a replayed tree
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};

use chrono::Local;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::Config;
use crate::tree::{FileId, FileSystem, FolderId};

/// Pending step of the manifest walk
enum Step {
    Open(FolderId),
    File(FileId),
    Close,
}

/// XML writer for the materialized tree
pub struct XmlWriter {
    /// Writer configuration
    config: Config,
}

impl XmlWriter {
    /// Create a new XML writer
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Write the tree to the configured output file
    pub fn write(&self, fs: &FileSystem) -> io::Result<()> {
        let file = File::create(&self.config.output_file)?;
        let mut writer = BufWriter::new(file);
        self.write_to(fs, &mut writer)?;
        writer.flush()
    }

    /// Write the tree to any writer
    pub fn write_to<W: Write>(&self, fs: &FileSystem, out: W) -> io::Result<()> {
        let mut xml_writer = Writer::new_with_indent(out, b' ', 2);

        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut start_tag = BytesStart::new("manifest");
        let timestamp = Local::now().to_rfc3339();
        let bulk = fs.current_bulk().to_string();
        start_tag.push_attribute(("timestamp", timestamp.as_str()));
        start_tag.push_attribute(("bulk", bulk.as_str()));
        xml_writer.write_event(Event::Start(start_tag))?;

        self.write_system_info(&mut xml_writer)?;
        self.write_folders(fs, &mut xml_writer)?;

        xml_writer.write_event(Event::End(BytesEnd::new("manifest")))?;

        Ok(())
    }

    /// Write system information to XML
    fn write_system_info<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("system_info")))?;

        writer.write_event(Event::Start(BytesStart::new("hostname")))?;
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        writer.write_event(Event::Text(BytesText::new(&hostname)))?;
        writer.write_event(Event::End(BytesEnd::new("hostname")))?;

        writer.write_event(Event::Start(BytesStart::new("os")))?;
        writer.write_event(Event::Text(BytesText::new(std::env::consts::OS)))?;
        writer.write_event(Event::End(BytesEnd::new("os")))?;

        writer.write_event(Event::End(BytesEnd::new("system_info")))?;

        Ok(())
    }

    /// Write the folder tree from the root, subfolders before files
    fn write_folders<W: Write>(&self, fs: &FileSystem, writer: &mut Writer<W>) -> io::Result<()> {
        let mut steps = vec![Step::Open(fs.root())];

        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::File(id) => {
                    self.write_file(fs, id, writer)?;
                    continue;
                }
                Step::Close => {
                    writer.write_event(Event::End(BytesEnd::new("folder")))?;
                    continue;
                }
            };
            let Some(folder) = fs.folder(id) else {
                continue;
            };

            let path = fs.folder_path(id);
            let bulk = folder.bulk_number().to_string();
            let mut start_tag = BytesStart::new("folder");
            start_tag.push_attribute(("name", folder.name()));
            start_tag.push_attribute(("path", path.as_str()));
            start_tag.push_attribute(("bulk_number", bulk.as_str()));
            writer.write_event(Event::Start(start_tag))?;

            // Pushed in reverse of the output order
            steps.push(Step::Close);
            let files: Vec<FileId> = folder.files().map(|(_, file)| file).collect();
            steps.extend(files.into_iter().rev().map(Step::File));
            let children: Vec<FolderId> = folder.folders().map(|(_, child)| child).collect();
            steps.extend(children.into_iter().rev().map(Step::Open));
        }

        Ok(())
    }

    /// Write a file with its versions
    fn write_file<W: Write>(
        &self,
        fs: &FileSystem,
        id: FileId,
        writer: &mut Writer<W>,
    ) -> io::Result<()> {
        let Some(file) = fs.file(id) else {
            return Ok(());
        };

        let path = fs.file_path(id);
        let mut start_tag = BytesStart::new("file");
        start_tag.push_attribute(("name", file.name()));
        start_tag.push_attribute(("path", path.as_str()));
        writer.write_event(Event::Start(start_tag))?;

        for version in file.versions() {
            let action_id = version.action_id.to_string();
            let bulk = version.bulk_number.to_string();
            let mut tag = BytesStart::new("version");
            tag.push_attribute(("action_id", action_id.as_str()));
            tag.push_attribute(("bulk_number", bulk.as_str()));
            tag.push_attribute(("hash", version.hash.as_str()));
            writer.write_event(Event::Empty(tag))?;
        }

        writer.write_event(Event::End(BytesEnd::new("file")))?;

        Ok(())
    }
}
