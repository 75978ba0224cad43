use crate::{Error, Result};
use bitarray::BitArray;
use ndarray::Array2;
use opencv::core::{self, Mat};
use opencv::prelude::*;

/// Descriptors computed by [`crate::Detector::detect_and_compute`], one row
/// per returned keypoint.
#[derive(Debug, Clone)]
pub enum Descriptors {
    /// 256-bit binary strings (ORB).
    Binary256(Vec<BitArray<32>>),
    /// Binary strings of up to 512 bits (BRISK, AKAZE). AKAZE's 486-bit MLDB
    /// strings are padded with zero bits.
    Binary512(Vec<BitArray<64>>),
    /// 128 float gradient histograms per row (SIFT).
    Float128(Array2<f32>),
}

/// The row layout a describing detector produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorLayout {
    Binary256,
    Binary512,
    Float128,
}

impl Descriptors {
    /// Number of descriptors (rows).
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary256(rows) => rows.len(),
            Descriptors::Binary512(rows) => rows.len(),
            Descriptors::Float128(rows) => rows.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of one descriptor in bytes.
    pub fn descriptor_bytes(&self) -> usize {
        match self {
            Descriptors::Binary256(_) => 32,
            Descriptors::Binary512(_) => 64,
            Descriptors::Float128(rows) => rows.ncols() * std::mem::size_of::<f32>(),
        }
    }

    /// Read the descriptor matrix OpenCV filled in.
    ///
    /// A detector that found nothing leaves the matrix empty, which gives an
    /// empty set of the expected layout.
    pub(crate) fn from_mat(detector: &str, layout: DescriptorLayout, mat: &Mat) -> Result<Self> {
        if mat.empty() || mat.rows() == 0 {
            return Ok(match layout {
                DescriptorLayout::Binary256 => Descriptors::Binary256(vec![]),
                DescriptorLayout::Binary512 => Descriptors::Binary512(vec![]),
                DescriptorLayout::Float128 => Descriptors::Float128(Array2::zeros((0, 128))),
            });
        }
        let layout_error = || Error::DescriptorLayout {
            detector: detector.to_owned(),
            typ: mat.typ(),
            cols: mat.cols(),
        };

        let owned;
        let mat = if mat.is_continuous() {
            mat
        } else {
            owned = mat.try_clone()?;
            &owned
        };
        let (rows, cols) = (mat.rows() as usize, mat.cols() as usize);
        match layout {
            DescriptorLayout::Binary256 if mat.typ() == core::CV_8U && cols <= 32 => {
                Ok(Descriptors::Binary256(bit_rows(mat.data_bytes()?, cols)))
            }
            DescriptorLayout::Binary512 if mat.typ() == core::CV_8U && cols <= 64 => {
                Ok(Descriptors::Binary512(bit_rows(mat.data_bytes()?, cols)))
            }
            DescriptorLayout::Float128 if mat.typ() == core::CV_32F && cols == 128 => {
                let values = mat.data_typed::<f32>()?.to_vec();
                let rows = Array2::from_shape_vec((rows, cols), values)
                    .map_err(|_| layout_error())?;
                Ok(Descriptors::Float128(rows))
            }
            _ => Err(layout_error()),
        }
    }
}

fn bit_rows<const B: usize>(data: &[u8], cols: usize) -> Vec<BitArray<B>> {
    data.chunks_exact(cols)
        .map(|row| {
            let mut bytes = [0u8; B];
            bytes[..cols].copy_from_slice(row);
            BitArray::new(bytes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        let orb = Descriptors::Binary256(vec![BitArray::zeros(); 3]);
        assert_eq!(orb.len(), 3);
        assert_eq!(orb.descriptor_bytes(), 32);

        let sift = Descriptors::Float128(Array2::zeros((2, 128)));
        assert_eq!(sift.len(), 2);
        assert_eq!(sift.descriptor_bytes(), 512);

        assert!(Descriptors::Binary512(vec![]).is_empty());
    }

    #[test]
    fn short_binary_rows_are_padded() {
        // AKAZE's full MLDB descriptor takes 61 bytes.
        let rows = [[0xffu8; 61], [0x01u8; 61]];
        let mat = Mat::from_slice_2d(&rows).unwrap();
        let descriptors = Descriptors::from_mat("AKAZE", DescriptorLayout::Binary512, &mat).unwrap();
        match descriptors {
            Descriptors::Binary512(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].weight(), 61 * 8);
                assert_eq!(rows[1].weight(), 61);
                assert_eq!(&rows[0].bytes()[61..], &[0u8, 0, 0]);
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn float_rows() {
        let mut row = [0.0f32; 128];
        row[5] = 0.25;
        let mat = Mat::from_slice_2d(&[row, [1.0; 128]]).unwrap();
        match Descriptors::from_mat("SIFT", DescriptorLayout::Float128, &mat).unwrap() {
            Descriptors::Float128(rows) => {
                assert_eq!(rows.dim(), (2, 128));
                assert_eq!(rows[(0, 5)], 0.25);
                assert_eq!(rows[(1, 127)], 1.0);
            }
            other => panic!("unexpected layout {:?}", other),
        }
    }

    #[test]
    fn empty_matrix_gives_empty_set() {
        let descriptors =
            Descriptors::from_mat("ORB", DescriptorLayout::Binary256, &Mat::default()).unwrap();
        assert!(matches!(descriptors, Descriptors::Binary256(rows) if rows.is_empty()));
    }

    #[test]
    fn mismatched_matrix_is_an_error() {
        let mat = Mat::from_slice_2d(&[[0.5f32; 32]]).unwrap();
        assert!(matches!(
            Descriptors::from_mat("ORB", DescriptorLayout::Binary256, &mat),
            Err(Error::DescriptorLayout { cols: 32, .. })
        ));
    }
}
