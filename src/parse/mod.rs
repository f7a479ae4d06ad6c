pub mod preset_xml;
