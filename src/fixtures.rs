//! Small legacy/reform datasets shared by unit tests. They go through the same
//! dump extraction and loading path as real input.

use crate::dataset::{Dataset, DatasetEdition, extract_rows};

pub const LEGACY_DUMP: &str = "
INSERT INTO administrative_units (id, full_name, short_name) VALUES
  (3, 'Thành phố thuộc tỉnh', 'Thành phố'),
  (5, 'Quận', 'Quận'),
  (6, 'Thị xã', 'Thị xã'),
  (7, 'Huyện', 'Huyện'),
  (8, 'Phường', 'Phường'),
  (9, 'Thị trấn', 'Thị trấn'),
  (10, 'Xã', 'Xã');

INSERT INTO provinces (code, name, full_name, administrative_unit_id) VALUES
  ('25', 'Phú Thọ', 'Tỉnh Phú Thọ', 2),
  ('26', 'Vĩnh Phúc', 'Tỉnh Vĩnh Phúc', 2);

INSERT INTO districts (code, name, full_name, province_code, administrative_unit_id) VALUES
  ('227', 'Thanh Sơn', 'Huyện Thanh Sơn', '25', 7),
  ('228', 'Tân Sơn', 'Huyện Tân Sơn', '25', 7),
  ('229', 'Cẩm Khê', 'Huyện Cẩm Khê', '25', 7),
  ('230', 'Việt Trì', 'Thành phố Việt Trì', '25', 3),
  ('250', 'Lập Thạch', 'Huyện Lập Thạch', '26', 7);

INSERT INTO wards (code, name, full_name, district_code, administrative_unit_id) VALUES
  ('07001', 'Phú Thành', 'Xã Phú Thành', '227', 10),
  ('07002', 'Hương Cần', 'Xã Hương Cần', '227', 10),
  ('07003', 'Tân Lập', 'Xã Tân Lập', '227', 10),
  ('07004', 'Thanh Sơn', 'Thị trấn Thanh Sơn', '227', 9),
  ('07101', 'Phú Thành', 'Xã Phú Thành', '228', 10),
  ('07102', 'Tân Minh', 'Xã Tân Minh', '228', 10),
  ('07103', 'Tân Lập', 'Xã Tân Lập', '228', 10),
  ('07201', 'Tân Lập', 'Xã Tân Lập', '229', 10),
  ('07202', 'Phú Lộc', 'Xã Phú Lộc', '229', 10),
  ('07203', 'Văn Khúc', 'Xã Văn Khúc', '229', 10),
  ('07301', 'XII', 'Phường XII', '230', 8),
  ('07302', 'Gia Cẩm', 'Phường Gia Cẩm', '230', 8),
  ('08001', 'Tân Lập', 'Xã Tân Lập', '250', 10),
  ('08002', 'Phù Lộc', 'Xã Phù Lộc', '250', 10),
  ('08003', 'Hợp Lý', 'Xã Hợp Lý', '250', 10);
";

pub const REFORM_DUMP: &str = "
INSERT INTO administrative_units (id, full_name, short_name) VALUES
  (3, 'Phường', 'Phường'),
  (4, 'Xã', 'Xã'),
  (5, 'Đặc khu', 'Đặc khu');

INSERT INTO provinces (code, name, full_name, administrative_unit_id) VALUES
  ('25', 'Phú Thọ', 'Tỉnh Phú Thọ', 2),
  ('40', 'Nghệ An', 'Tỉnh Nghệ An', 2);

INSERT INTO wards (code, name, full_name, province_code, administrative_unit_id) VALUES
  ('07001', 'Phú Thành', 'Xã Phú Thành', '25', 4),
  ('07003', 'Tân Lập', 'Xã Tân Lập', '25', 4),
  ('07202', 'Cẩm Khê', 'Xã Cẩm Khê', '25', 4),
  ('07302', 'Việt Trì', 'Phường Việt Trì', '25', 3),
  ('08003', 'Lập Thạch', 'Xã Lập Thạch', '25', 4),
  ('40001', 'Phú Thành', 'Xã Phú Thành', '40', 4),
  ('40002', 'Tân Lập', 'Xã Tân Lập', '40', 4);
";

pub fn legacy() -> Dataset {
    let rows = extract_rows(LEGACY_DUMP).expect("legacy fixture parses");
    Dataset::load(DatasetEdition::Legacy, &rows).expect("legacy fixture loads")
}

pub fn reform() -> Dataset {
    let rows = extract_rows(REFORM_DUMP).expect("reform fixture parses");
    Dataset::load(DatasetEdition::Reform, &rows).expect("reform fixture loads")
}
